//! Store backends.
//!
//! The graph codec talks to a [`KvStore`] trait object's worth of primitives:
//! hash records, index sets, existence checks, and prefix scans. Two
//! implementations ship here: [`RedisKvStore`] for production and
//! [`MemoryKvStore`] for tests and in-process embedding.

pub mod memory;
pub mod redis;
pub mod traits;

pub use memory::MemoryKvStore;
pub use redis::RedisKvStore;
pub use traits::{KvStore, StoreError};
