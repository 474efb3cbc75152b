use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::customer::Customer;
use crate::domain::role::UserType;

/// The full result of one directory fetch for a single role.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectorySnapshot {
    pub role: UserType,
    pub customers: Vec<Customer>,
    /// Continuation cursor, carried but not consumed.
    pub next_token: Option<String>,
    pub fetched_at: DateTime<Utc>,
}

impl DirectorySnapshot {
    pub fn new(role: UserType, customers: Vec<Customer>, next_token: Option<String>) -> Self {
        Self { role, customers, next_token, fetched_at: Utc::now() }
    }

    pub fn empty(role: UserType) -> Self {
        Self::new(role, Vec::new(), None)
    }

    pub fn len(&self) -> usize {
        self.customers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.customers.is_empty()
    }
}
