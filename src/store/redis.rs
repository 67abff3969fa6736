//! Redis backend for the graph store.
//!
//! Entity records are plain hashes (`HSET`/`HGET`), reverse indexes are sets
//! (`SADD`/`SMEMBERS`), and bulk reads enumerate record keys with cursor-based
//! `SCAN` rather than `KEYS`, which would block the server on large keyspaces.
//!
//! An optional namespace prefix can be prepended to every key so the store
//! can share a Redis instance with other applications; it is stripped again
//! before keys are handed back from scans, so the codec never sees it.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

use super::traits::{KvStore, StoreError};

/// Attempts made to establish the initial connection before giving up.
/// Operations themselves are never retried; failures surface to the caller.
const CONNECT_ATTEMPTS: usize = 5;
const CONNECT_INITIAL_DELAY: Duration = Duration::from_millis(200);
const CONNECT_MAX_DELAY: Duration = Duration::from_secs(2);

/// How many keys to request per SCAN round trip.
const SCAN_COUNT: usize = 100;

pub struct RedisKvStore {
    connection: ConnectionManager,
    prefix: String,
}

impl RedisKvStore {
    /// Connect without a key namespace.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        Self::with_prefix(url, None).await
    }

    /// Connect with an optional key namespace.
    ///
    /// The prefix is prepended to every key, e.g. `"myapp:"` stores a Path
    /// record under `myapp:Path:<id>`.
    pub async fn with_prefix(url: &str, prefix: Option<&str>) -> Result<Self, StoreError> {
        let client = Client::open(url).map_err(|e| StoreError::Backend(e.to_string()))?;
        let connection = connect_manager(client)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        Ok(Self {
            connection,
            prefix: prefix.unwrap_or("").to_string(),
        })
    }

    #[inline]
    fn prefixed_key(&self, key: &str) -> String {
        if self.prefix.is_empty() {
            key.to_string()
        } else {
            format!("{}{}", self.prefix, key)
        }
    }

    #[inline]
    fn strip_prefix<'a>(&self, key: &'a str) -> &'a str {
        if self.prefix.is_empty() {
            key
        } else {
            key.strip_prefix(&self.prefix).unwrap_or(key)
        }
    }
}

/// Establish the connection manager with bounded exponential backoff.
/// Fast-fail at startup so configuration errors are caught quickly.
async fn connect_manager(client: Client) -> Result<ConnectionManager, redis::RedisError> {
    let mut delay = CONNECT_INITIAL_DELAY;
    let mut attempts = 0;

    loop {
        match ConnectionManager::new(client.clone()).await {
            Ok(conn) => {
                if attempts > 0 {
                    info!(attempts, "redis connection established after retries");
                }
                return Ok(conn);
            }
            Err(err) => {
                attempts += 1;
                if attempts >= CONNECT_ATTEMPTS {
                    return Err(err);
                }
                warn!(
                    attempts,
                    error = %err,
                    "redis connection failed, retrying in {:?}",
                    delay
                );
                sleep(delay).await;
                delay = (delay * 2).min(CONNECT_MAX_DELAY);
            }
        }
    }
}

#[async_trait]
impl KvStore for RedisKvStore {
    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        let mut conn = self.connection.clone();
        let key = self.prefixed_key(key);

        let exists: bool = conn
            .exists(&key)
            .await
            .map_err(|e| StoreError::Backend(format!("EXISTS {}: {}", key, e)))?;

        Ok(exists)
    }

    async fn hash_set(&self, key: &str, field: &str, value: &str) -> Result<(), StoreError> {
        let mut conn = self.connection.clone();
        let key = self.prefixed_key(key);

        let _: () = conn
            .hset(&key, field, value)
            .await
            .map_err(|e| StoreError::Backend(format!("HSET {} {}: {}", key, field, e)))?;

        Ok(())
    }

    async fn hash_get(&self, key: &str, field: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.connection.clone();
        let key = self.prefixed_key(key);

        let value: Option<String> = conn
            .hget(&key, field)
            .await
            .map_err(|e| StoreError::Backend(format!("HGET {} {}: {}", key, field, e)))?;

        Ok(value)
    }

    async fn set_add(&self, key: &str, member: &str) -> Result<(), StoreError> {
        let mut conn = self.connection.clone();
        let key = self.prefixed_key(key);

        let _: () = conn
            .sadd(&key, member)
            .await
            .map_err(|e| StoreError::Backend(format!("SADD {}: {}", key, e)))?;

        Ok(())
    }

    async fn set_members(&self, key: &str) -> Result<Vec<String>, StoreError> {
        let mut conn = self.connection.clone();
        let key = self.prefixed_key(key);

        let members: Vec<String> = conn
            .smembers(&key)
            .await
            .map_err(|e| StoreError::Backend(format!("SMEMBERS {}: {}", key, e)))?;

        Ok(members)
    }

    async fn scan_keys(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let mut conn = self.connection.clone();
        let pattern = format!("{}{}*", self.prefix, prefix);

        let mut keys = Vec::new();
        let mut cursor = 0u64;

        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_COUNT)
                .query_async(&mut conn)
                .await
                .map_err(|e| StoreError::Backend(format!("SCAN {}: {}", pattern, e)))?;

            keys.extend(batch.iter().map(|k| self.strip_prefix(k).to_string()));
            cursor = next;

            if cursor == 0 {
                break;
            }
        }

        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn scan_pattern_includes_namespace() {
        // prefixed_key/strip_prefix are exercised against live Redis in
        // tests/integration.rs; here just pin the pattern shape.
        let pattern = format!("{}{}*", "myapp:", "Path:");
        assert_eq!(pattern, "myapp:Path:*");
    }
}
