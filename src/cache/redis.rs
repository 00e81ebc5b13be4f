use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use super::CounterStore;
use crate::errors::{MutationError, MutationResult};
use crate::utils::parse_int;

/// Counter store backed by Redis hashes
#[derive(Clone)]
pub struct RedisCounterStore {
    connection: ConnectionManager,
}

impl RedisCounterStore {
    pub async fn connect(url: &str) -> MutationResult<Self> {
        let client = redis::Client::open(url).map_err(cache_error)?;
        let connection = client.get_connection_manager().await.map_err(cache_error)?;
        Ok(Self { connection })
    }
}

fn cache_error(err: redis::RedisError) -> MutationError {
    MutationError::Cache(err.to_string())
}

#[async_trait]
impl CounterStore for RedisCounterStore {
    async fn hget(&self, key: &str, field: &str) -> MutationResult<Option<i64>> {
        let mut connection = self.connection.clone();
        let value: Option<String> = connection.hget(key, field).await.map_err(cache_error)?;
        Ok(parse_int(value.as_deref()))
    }

    async fn hincrby(&self, key: &str, field: &str, delta: i64) -> MutationResult<i64> {
        let mut connection = self.connection.clone();
        connection.hincr(key, field, delta).await.map_err(cache_error)
    }

    async fn hdel(&self, key: &str, field: &str) -> MutationResult<()> {
        let mut connection = self.connection.clone();
        let _: i64 = connection.hdel(key, field).await.map_err(cache_error)?;
        Ok(())
    }
}
