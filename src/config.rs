//! Configuration for the graph store.
//!
//! # Example
//!
//! ```
//! use lightauth_store::StoreConfig;
//!
//! // Minimal config (uses defaults)
//! let config = StoreConfig::default();
//! assert_eq!(config.redis_url, "redis://127.0.0.1:6379");
//! assert_eq!(config.id_length, 16);
//!
//! // Full config
//! let config = StoreConfig {
//!     redis_url: "redis://:secret@redis.internal:6379/2".into(),
//!     key_prefix: Some("lightauth:".into()),
//!     id_length: 12,
//! };
//! ```

use serde::Deserialize;

use crate::alloc::DEFAULT_ID_LENGTH;

/// Configuration for [`GraphStore::connect`](crate::GraphStore::connect).
///
/// All fields have defaults; password and database index travel inside the
/// Redis URL (`redis://:pass@host:port/db`).
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Redis connection string.
    #[serde(default = "default_redis_url")]
    pub redis_url: String,

    /// Optional namespace prepended to every key, for sharing a Redis
    /// instance with other applications (e.g. `"lightauth:"`).
    #[serde(default)]
    pub key_prefix: Option<String>,

    /// Length of allocated identifiers (default: 16).
    #[serde(default = "default_id_length")]
    pub id_length: usize,
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}

fn default_id_length() -> usize {
    DEFAULT_ID_LENGTH
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            redis_url: default_redis_url(),
            key_prefix: None,
            id_length: default_id_length(),
        }
    }
}
