//! Pure list-narrowing functions applied to a directory snapshot.
//!
//! Both filters borrow their input and return an ordered subsequence of it.

use crate::domain::customer::Customer;
use crate::domain::role::UserType;

/// Customers whose role equals `role`, compared case-insensitively.
///
/// The query variable sent upstream already asks for this role, but the
/// result is narrowed again here so an over-returning server cannot leak
/// other roles into the list.
pub fn filter_by_role(customers: &[Customer], role: UserType) -> Vec<&Customer> {
    customers.iter().filter(|customer| role.matches(&customer.role)).collect()
}

/// Customers whose name contains `query` as a case-insensitive substring.
/// A whitespace-only query keeps every customer; any other query is matched as typed.
pub fn filter_by_name<'a>(customers: &[&'a Customer], query: &str) -> Vec<&'a Customer> {
    if query.trim().is_empty() {
        return customers.to_vec();
    }
    let needle = query.to_lowercase();

    customers
        .iter()
        .copied()
        .filter(|customer| customer.name.to_lowercase().contains(&needle))
        .collect()
}
