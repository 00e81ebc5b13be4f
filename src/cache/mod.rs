//! Per-user counters kept in an external hash store
//!
//! Counters live in a hash named by a registration key, one field per user id.
//! The store is optional: without one, counting is disabled and mutations run
//! as usual. Store failures are logged and never fail a request.

mod memory;
#[cfg(feature = "redis")]
mod redis;

pub use memory::MemoryCounterStore;
#[cfg(feature = "redis")]
pub use self::redis::RedisCounterStore;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::config::RedisConfig;
use crate::errors::MutationResult;

/// Hash-of-counters backend (`HGET`, `HINCRBY`, `HDEL`)
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Current value, `None` when absent or not a number
    async fn hget(&self, key: &str, field: &str) -> MutationResult<Option<i64>>;

    /// Add `delta` and return the new value
    async fn hincrby(&self, key: &str, field: &str, delta: i64) -> MutationResult<i64>;

    async fn hdel(&self, key: &str, field: &str) -> MutationResult<()>;
}

/// Registers users in counter hashes
#[derive(Clone, Default)]
pub struct UserRegistry {
    store: Option<Arc<dyn CounterStore>>,
}

impl UserRegistry {
    pub fn new(store: Arc<dyn CounterStore>) -> Self {
        Self { store: Some(store) }
    }

    /// A registry that tracks nothing
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn from_store(store: Option<Arc<dyn CounterStore>>) -> Self {
        Self { store }
    }

    pub fn is_enabled(&self) -> bool {
        self.store.is_some()
    }

    /// Increment the user's counter, or decrement it when `delete` is set.
    ///
    /// A counter at or below zero is removed instead of decremented. Returns the
    /// new value, `None` when nothing is stored afterwards or tracking is off.
    pub async fn track(&self, key: &str, user_id: Option<i32>, delete: bool) -> Option<i64> {
        let (Some(store), Some(user_id)) = (&self.store, user_id) else {
            return None;
        };
        let field = user_id.to_string();

        match Self::apply(store.as_ref(), key, &field, delete).await {
            Ok(value) => {
                debug!(key, user_id, delete, value = ?value, "user counter updated");
                value
            }
            Err(err) => {
                warn!(key, user_id, error = %err, "user counter update failed");
                None
            }
        }
    }

    async fn apply(
        store: &dyn CounterStore,
        key: &str,
        field: &str,
        delete: bool,
    ) -> MutationResult<Option<i64>> {
        let current = store.hget(key, field).await?.unwrap_or(0);
        if delete && current <= 0 {
            store.hdel(key, field).await?;
            return Ok(None);
        }
        let delta = if delete { -1 } else { 1 };
        store.hincrby(key, field, delta).await.map(Some)
    }

    /// Current counter of a user
    pub async fn count(&self, key: &str, user_id: i32) -> Option<i64> {
        let store = self.store.as_ref()?;
        store.hget(key, &user_id.to_string()).await.ok().flatten()
    }
}

/// Connect the configured counter store. Returns `None` when counting is
/// disabled or the backend is unreachable.
pub async fn connect_counter_store(config: &RedisConfig) -> Option<Arc<dyn CounterStore>> {
    if !config.enabled {
        debug!("counter store disabled by configuration");
        return None;
    }

    #[cfg(feature = "redis")]
    {
        match RedisCounterStore::connect(&config.url()).await {
            Ok(store) => {
                tracing::info!(host = %config.host, port = config.port, db = config.db, "connected to redis");
                Some(Arc::new(store))
            }
            Err(err) => {
                warn!(error = %err, "redis unavailable, user counters disabled");
                None
            }
        }
    }

    #[cfg(not(feature = "redis"))]
    {
        warn!("built without redis support, user counters disabled");
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::MutationError;

    struct BrokenStore;

    #[async_trait]
    impl CounterStore for BrokenStore {
        async fn hget(&self, _key: &str, _field: &str) -> MutationResult<Option<i64>> {
            Err(MutationError::Cache("connection refused".to_string()))
        }

        async fn hincrby(&self, _key: &str, _field: &str, _delta: i64) -> MutationResult<i64> {
            Err(MutationError::Cache("connection refused".to_string()))
        }

        async fn hdel(&self, _key: &str, _field: &str) -> MutationResult<()> {
            Err(MutationError::Cache("connection refused".to_string()))
        }
    }

    #[tokio::test]
    async fn test_increment_and_decrement() {
        let registry = UserRegistry::new(Arc::new(MemoryCounterStore::new()));

        assert_eq!(registry.track("online", Some(7), false).await, Some(1));
        assert_eq!(registry.track("online", Some(7), false).await, Some(2));
        assert_eq!(registry.track("online", Some(7), true).await, Some(1));
        assert_eq!(registry.count("online", 7).await, Some(1));
    }

    #[tokio::test]
    async fn test_decrement_at_zero_removes_entry() {
        let store = Arc::new(MemoryCounterStore::new());
        let registry = UserRegistry::new(store.clone());

        assert_eq!(registry.track("online", Some(7), false).await, Some(1));
        assert_eq!(registry.track("online", Some(7), true).await, Some(0));
        assert_eq!(registry.track("online", Some(7), true).await, None);
        assert_eq!(store.hget("online", "7").await.unwrap(), None);

        // Never driven below zero
        assert_eq!(registry.track("online", Some(7), true).await, None);
        assert_eq!(store.hget("online", "7").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_anonymous_and_disabled_are_not_tracked() {
        let registry = UserRegistry::new(Arc::new(MemoryCounterStore::new()));
        assert_eq!(registry.track("online", None, false).await, None);

        let disabled = UserRegistry::disabled();
        assert!(!disabled.is_enabled());
        assert_eq!(disabled.track("online", Some(1), false).await, None);
    }

    #[tokio::test]
    async fn test_store_failure_is_swallowed() {
        let registry = UserRegistry::new(Arc::new(BrokenStore));
        assert_eq!(registry.track("online", Some(1), false).await, None);
    }

    #[tokio::test]
    async fn test_disabled_config_yields_no_store() {
        let config = RedisConfig {
            enabled: false,
            ..RedisConfig::default()
        };
        assert!(connect_counter_store(&config).await.is_none());
    }
}
