use async_trait::async_trait;

use crate::domain::role::UserType;
use crate::domain::snapshot::DirectorySnapshot;
use crate::errors::FetchError;

/// Name of the upstream directory query, also the cache key namespace.
pub const LIST_CUSTOMERS_OPERATION: &str = "ListZellerCustomers";

/// Remote source of directory snapshots.
#[async_trait]
pub trait DirectoryGateway: Send + Sync {
    async fn list_customers(&self, role: UserType) -> Result<DirectorySnapshot, FetchError>;
}

#[async_trait]
impl<G> DirectoryGateway for std::sync::Arc<G>
where
    G: DirectoryGateway + ?Sized,
{
    async fn list_customers(&self, role: UserType) -> Result<DirectorySnapshot, FetchError> {
        (**self).list_customers(role).await
    }
}
