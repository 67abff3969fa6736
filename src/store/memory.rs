use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::{HashMap, HashSet};

use super::traits::{KvStore, StoreError};

/// In-process store backend.
///
/// Hash records and index sets live in two concurrent maps. Used by the
/// test suite and by embedders that want the codec without a Redis server;
/// semantics match the Redis backend (sets deduplicate, missing sets read
/// as empty, scans are unordered).
pub struct MemoryKvStore {
    hashes: DashMap<String, HashMap<String, String>>,
    sets: DashMap<String, HashSet<String>>,
}

impl MemoryKvStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            hashes: DashMap::new(),
            sets: DashMap::new(),
        }
    }

    /// Number of hash records currently stored.
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.hashes.len()
    }

    /// Drop every record and set.
    pub fn clear(&self) {
        self.hashes.clear();
        self.sets.clear();
    }
}

impl Default for MemoryKvStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KvStore for MemoryKvStore {
    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.hashes.contains_key(key) || self.sets.contains_key(key))
    }

    async fn hash_set(&self, key: &str, field: &str, value: &str) -> Result<(), StoreError> {
        self.hashes
            .entry(key.to_string())
            .or_default()
            .insert(field.to_string(), value.to_string());
        Ok(())
    }

    async fn hash_get(&self, key: &str, field: &str) -> Result<Option<String>, StoreError> {
        Ok(self
            .hashes
            .get(key)
            .and_then(|record| record.get(field).cloned()))
    }

    async fn set_add(&self, key: &str, member: &str) -> Result<(), StoreError> {
        self.sets
            .entry(key.to_string())
            .or_default()
            .insert(member.to_string());
        Ok(())
    }

    async fn set_members(&self, key: &str) -> Result<Vec<String>, StoreError> {
        Ok(self
            .sets
            .get(key)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn scan_keys(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let mut keys: Vec<String> = self
            .hashes
            .iter()
            .map(|entry| entry.key().clone())
            .filter(|k| k.starts_with(prefix))
            .collect();
        keys.extend(
            self.sets
                .iter()
                .map(|entry| entry.key().clone())
                .filter(|k| k.starts_with(prefix)),
        );
        Ok(keys)
    }
}
