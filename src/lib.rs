//! # lightauth-store
//!
//! Redis-backed persistence for the lightauth entity graph.
//!
//! ## Architecture
//!
//! Two root kinds (Path, Route) own small trees of children. The store has
//! no relational queries, so the graph is flattened into independent hash
//! records plus reverse index sets, and reconstructed from prefix scans
//! and set membership alone:
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                       GraphStore                           │
//! │  create / edit          │        client_data / server_data │
//! │  (flatten one entity)   │        (rebuild whole forests)   │
//! └────────────┬────────────┴──────────────────┬───────────────┘
//!              ▼                               ▼
//! ┌────────────────────────┐      ┌─────────────────────────────┐
//! │      Write codec       │      │         Read codec          │
//! │  Kind:ID hash record   │      │  SCAN Kind:* → fetch fields │
//! │  + index set re-adds   │      │  → walk index sets → rewire │
//! └────────────┬───────────┘      └──────────────┬──────────────┘
//!              ▼                                 ▼
//! ┌────────────────────────────────────────────────────────────┐
//! │              KvStore (Redis / in-memory)                   │
//! │  exists · hash get/set · set add/members · prefix scan     │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every parent→children edge is stored twice: a forward pointer field on
//! the child and a reverse index set under the parent. Writes keep both in
//! step; reads trust the index sets and rebuild the in-memory
//! back-references (`Weak`, never owning) from them.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lightauth_store::{GraphStore, StoreConfig, Record, Path, Invoice};
//! use lightauth_store::model::shared;
//! use chrono::DateTime;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = StoreConfig {
//!         redis_url: "redis://localhost:6379".into(),
//!         ..Default::default()
//!     };
//!     let db = GraphStore::connect(&config).await?;
//!
//!     let expires = DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z")?;
//!     let path = shared(Path::new(
//!         "https://x", 10, 5, "strict", "daily", "tok1", expires, expires,
//!     ));
//!     let id = db.create(&Record::Path(path.clone())).await?;
//!     println!("persisted Path:{}", id);
//!
//!     let invoice = Path::attach_invoice(
//!         &path,
//!         Invoice::new("lnbc1...", vec![0xde, 0xad], vec![0xbe, 0xef], 1, expires),
//!     );
//!     db.create(&Record::Invoice(invoice)).await?;
//!
//!     // Later, from a cold start:
//!     let paths = db.client_data().await?;
//!     assert!(paths.contains_key("https://x"));
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`provider`]: the [`GraphStore`] four-operation surface
//! - [`model`]: the entity graph (Path, Route, Client, Invoice)
//! - [`codec`]: flattening and reconstruction
//! - [`alloc`]: collision-checked identifier allocation
//! - [`store`]: the key-value backends (Redis, in-memory)
//!
//! ## Caveats
//!
//! No multi-key operation is atomic: a failed write leaves a record
//! partially updated, and bulk reads are not isolated from concurrent
//! writers. Callers needing bounded latency should wrap the bulk reads in
//! their own timeout.

pub mod alloc;
pub mod codec;
pub mod config;
pub mod metrics;
pub mod model;
pub mod provider;
pub mod store;

pub use alloc::IdAllocator;
pub use config::StoreConfig;
pub use metrics::LatencyTimer;
pub use model::{
    Client, Invoice, InvoiceParent, Path, Record, Route, Shared, SharedClient, SharedInvoice,
    SharedPath, SharedRoute,
};
pub use provider::GraphStore;
pub use store::{KvStore, MemoryKvStore, RedisKvStore, StoreError};
