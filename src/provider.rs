//! The four-operation surface the owning application talks to.
//!
//! [`GraphStore`] wires the allocator and the codec around one injected
//! [`KvStore`] handle. The caller owns the store's lifecycle; nothing in
//! here is global.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::instrument;

use crate::alloc::IdAllocator;
use crate::codec::{read, write};
use crate::config::StoreConfig;
use crate::metrics::{self, LatencyTimer};
use crate::model::{Record, SharedPath, SharedRoute};
use crate::store::{KvStore, RedisKvStore, StoreError};

pub struct GraphStore<S: KvStore> {
    store: Arc<S>,
    allocator: IdAllocator<S>,
}

impl GraphStore<RedisKvStore> {
    /// Connect to Redis per `config` and build a store around it.
    pub async fn connect(config: &StoreConfig) -> Result<Self, StoreError> {
        let store = RedisKvStore::with_prefix(&config.redis_url, config.key_prefix.as_deref()).await?;
        Ok(Self::with_id_length(Arc::new(store), config.id_length))
    }
}

impl<S: KvStore> GraphStore<S> {
    pub fn new(store: S) -> Self {
        let store = Arc::new(store);
        let allocator = IdAllocator::new(store.clone());
        Self { store, allocator }
    }

    pub fn with_id_length(store: Arc<S>, id_length: usize) -> Self {
        let allocator = IdAllocator::with_length(store.clone(), id_length);
        Self { store, allocator }
    }

    /// Allocate a fresh ID for `record`, stamp it on the entity, and
    /// persist it. Returns the assigned ID.
    ///
    /// The write follows the allocation immediately to narrow the window
    /// in which a concurrent allocator could draw the same ID.
    #[instrument(skip(self, record), fields(kind = record.kind()))]
    pub async fn create(&self, record: &Record) -> Result<String, StoreError> {
        let _timer = LatencyTimer::new("create");

        let id = self.allocator.allocate(record.kind()).await?;
        record.set_id(&id);

        let result = self.write_record(record).await;
        metrics::record_operation("create", status_of(&result));
        result.map(|_| id)
    }

    /// Re-persist `record`: blind overwrite of every field plus an
    /// idempotent re-add to every index set its relationships imply.
    #[instrument(skip(self, record), fields(kind = record.kind(), id = %record.id()))]
    pub async fn edit(&self, record: &Record) -> Result<(), StoreError> {
        let _timer = LatencyTimer::new("edit");

        let result = self.write_record(record).await;
        metrics::record_operation("edit", status_of(&result));
        result
    }

    /// Rebuild every Path tree, keyed by URL.
    ///
    /// Full-snapshot scan; cost is proportional to everything reachable
    /// from the Path root kind. On duplicate URLs the last record scanned
    /// wins. Any fetch or parse failure aborts the whole call.
    #[instrument(skip(self))]
    pub async fn client_data(&self) -> Result<HashMap<String, SharedPath>, StoreError> {
        let _timer = LatencyTimer::new("client_data");

        let result = read::load_paths(self.store.as_ref()).await;
        metrics::record_operation("client_data", status_of(&result));
        if let Ok(forest) = &result {
            metrics::record_reconstruction("Path", forest.len());
        }
        result
    }

    /// Rebuild every Route tree, keyed by Name. Same contract as
    /// [`client_data`](Self::client_data), rooted at Route.
    #[instrument(skip(self))]
    pub async fn server_data(&self) -> Result<HashMap<String, SharedRoute>, StoreError> {
        let _timer = LatencyTimer::new("server_data");

        let result = read::load_routes(self.store.as_ref()).await;
        metrics::record_operation("server_data", status_of(&result));
        if let Ok(forest) = &result {
            metrics::record_reconstruction("Route", forest.len());
        }
        result
    }

    async fn write_record(&self, record: &Record) -> Result<(), StoreError> {
        let plan = write::plan(record)?;
        write::apply(self.store.as_ref(), &plan).await
    }
}

fn status_of<T>(result: &Result<T, StoreError>) -> &'static str {
    if result.is_ok() {
        "success"
    } else {
        "error"
    }
}
