pub mod customer;
pub mod role;
pub mod snapshot;

pub use customer::{Customer, CustomerId};
pub use role::UserType;
pub use snapshot::DirectorySnapshot;
