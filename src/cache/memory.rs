use async_trait::async_trait;
use dashmap::DashMap;

use super::CounterStore;
use crate::errors::MutationResult;

/// In-process counter store
#[derive(Debug, Default)]
pub struct MemoryCounterStore {
    hashes: DashMap<String, DashMap<String, i64>>,
}

impl MemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CounterStore for MemoryCounterStore {
    async fn hget(&self, key: &str, field: &str) -> MutationResult<Option<i64>> {
        Ok(self
            .hashes
            .get(key)
            .and_then(|hash| hash.get(field).map(|value| *value)))
    }

    async fn hincrby(&self, key: &str, field: &str, delta: i64) -> MutationResult<i64> {
        let hash = self.hashes.entry(key.to_string()).or_default();
        let mut value = hash.entry(field.to_string()).or_insert(0);
        *value += delta;
        Ok(*value)
    }

    async fn hdel(&self, key: &str, field: &str) -> MutationResult<()> {
        if let Some(hash) = self.hashes.get(key) {
            hash.remove(field);
        }
        Ok(())
    }
}
