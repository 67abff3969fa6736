use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store backend error: {0}")]
    Backend(String),
    #[error("record '{key}' is missing field '{field}'")]
    MissingField { key: String, field: String },
    #[error("corrupt field '{field}' on record '{key}': {reason}")]
    Corrupt {
        key: String,
        field: String,
        reason: String,
    },
    #[error("record '{key}' references a parent that is no longer alive")]
    DanglingParent { key: String },
}

/// The key-value collaborator behind the persistence layer.
///
/// Five primitives cover everything the graph codec needs: hash-field
/// records, unordered string sets for the reverse indexes, key existence
/// for the allocator, and prefix enumeration for bulk reads. Every call is
/// an independent round trip; nothing here is transactional.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Whether any record or set exists under `key`.
    async fn exists(&self, key: &str) -> Result<bool, StoreError>;

    /// Overwrite one named field of the hash record at `key`.
    async fn hash_set(&self, key: &str, field: &str, value: &str) -> Result<(), StoreError>;

    /// Read one named field of the hash record at `key`.
    ///
    /// `Ok(None)` means the field (or the whole record) is absent; the
    /// caller decides whether that is corruption.
    async fn hash_get(&self, key: &str, field: &str) -> Result<Option<String>, StoreError>;

    /// Add `member` to the set at `key`. Re-adding is a no-op.
    async fn set_add(&self, key: &str, member: &str) -> Result<(), StoreError>;

    /// All members of the set at `key`, in no particular order.
    /// A missing set reads as empty.
    async fn set_members(&self, key: &str) -> Result<Vec<String>, StoreError>;

    /// All keys starting with `prefix`, in no particular order.
    async fn scan_keys(&self, prefix: &str) -> Result<Vec<String>, StoreError>;
}
