use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::config::CacheConfig;
use crate::domain::role::UserType;
use crate::domain::snapshot::DirectorySnapshot;
use crate::errors::FetchError;
use crate::gateway::{DirectoryGateway, LIST_CUSTOMERS_OPERATION};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FetchPolicy {
    /// Serve a fresh cached snapshot when one exists.
    CacheFirst,
    /// Always round-trip to the gateway and replace the cached entry.
    NetworkOnly,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub operation: &'static str,
    pub role_variable: &'static str,
}

impl CacheKey {
    pub fn for_role(role: UserType) -> Self {
        Self { operation: LIST_CUSTOMERS_OPERATION, role_variable: role.query_variable() }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CacheSettings {
    pub enabled: bool,
    /// `None` keeps entries for the lifetime of the process.
    pub ttl: Option<Duration>,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self { enabled: true, ttl: None }
    }
}

impl From<&CacheConfig> for CacheSettings {
    fn from(config: &CacheConfig) -> Self {
        let ttl = (config.ttl_secs > 0).then(|| Duration::from_secs(config.ttl_secs));
        Self { enabled: config.enabled, ttl }
    }
}

/// Process-lifetime cache of the latest snapshot per query and role.
pub struct CachedDirectory<G> {
    gateway: G,
    settings: CacheSettings,
    entries: RwLock<HashMap<CacheKey, DirectorySnapshot>>,
}

impl<G> CachedDirectory<G>
where
    G: DirectoryGateway,
{
    pub fn new(gateway: G, settings: CacheSettings) -> Self {
        Self { gateway, settings, entries: RwLock::new(HashMap::new()) }
    }

    pub fn settings(&self) -> CacheSettings {
        self.settings
    }

    pub async fn fetch(
        &self,
        role: UserType,
        policy: FetchPolicy,
    ) -> Result<DirectorySnapshot, FetchError> {
        let key = CacheKey::for_role(role);

        if self.settings.enabled && policy == FetchPolicy::CacheFirst {
            let entries = self.entries.read().await;
            if let Some(snapshot) = entries.get(&key).filter(|snapshot| self.is_fresh(snapshot)) {
                debug!(
                    event_name = "directory.cache.hit",
                    role = role.query_variable(),
                    customers = snapshot.len(),
                    "serving cached directory snapshot"
                );
                return Ok(snapshot.clone());
            }
        }

        debug!(
            event_name = "directory.cache.miss",
            role = role.query_variable(),
            policy = ?policy,
            "fetching directory snapshot from gateway"
        );
        let snapshot = self.gateway.list_customers(role).await?;

        if self.settings.enabled {
            let mut entries = self.entries.write().await;
            entries.insert(key, snapshot.clone());
        }

        Ok(snapshot)
    }

    pub async fn cached(&self, role: UserType) -> Option<DirectorySnapshot> {
        let entries = self.entries.read().await;
        entries.get(&CacheKey::for_role(role)).cloned()
    }

    pub async fn invalidate(&self, role: UserType) -> bool {
        let mut entries = self.entries.write().await;
        entries.remove(&CacheKey::for_role(role)).is_some()
    }

    pub async fn clear(&self) {
        let mut entries = self.entries.write().await;
        entries.clear();
    }

    fn is_fresh(&self, snapshot: &DirectorySnapshot) -> bool {
        let Some(ttl) = self.settings.ttl else {
            return true;
        };
        match Utc::now().signed_duration_since(snapshot.fetched_at).to_std() {
            Ok(age) => age < ttl,
            // fetched_at in the future: clock moved backwards
            Err(_) => true,
        }
    }
}

/// Lets the screen treat the cache itself as its source of snapshots.
#[async_trait]
pub trait DirectorySource: Send + Sync {
    async fn fetch(
        &self,
        role: UserType,
        policy: FetchPolicy,
    ) -> Result<DirectorySnapshot, FetchError>;
}

#[async_trait]
impl<G> DirectorySource for CachedDirectory<G>
where
    G: DirectoryGateway,
{
    async fn fetch(
        &self,
        role: UserType,
        policy: FetchPolicy,
    ) -> Result<DirectorySnapshot, FetchError> {
        CachedDirectory::fetch(self, role, policy).await
    }
}
