// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Identifier allocation.
//!
//! IDs are short random alphanumeric strings, unique within a kind
//! namespace. Uniqueness comes from checking `Kind:ID` existence before
//! handing an ID out, not from the ID's construction — collisions are an
//! expected condition and simply retried with a fresh draw.
//!
//! Two concurrent callers can still race between the check and the first
//! write; callers narrow the window by writing immediately after
//! allocation (as `GraphStore::create` does), but store primitives alone
//! cannot close it.

use rand::{distributions::Alphanumeric, thread_rng, Rng};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use crate::codec::record_key;
use crate::metrics;
use crate::store::{KvStore, StoreError};

pub const DEFAULT_ID_LENGTH: usize = 16;

/// Every this many consecutive collisions, log that the ID space is tight.
const CONGESTION_LOG_INTERVAL: u32 = 100;

pub struct IdAllocator<S> {
    store: Arc<S>,
    length: usize,
}

impl<S: KvStore> IdAllocator<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self::with_length(store, DEFAULT_ID_LENGTH)
    }

    pub fn with_length(store: Arc<S>, length: usize) -> Self {
        Self { store, length }
    }

    /// Draw random IDs until one has no record under `kind:ID`.
    ///
    /// Collisions retry indefinitely; a failed existence check surfaces
    /// immediately — the store, not the draw, is the thing that can fail.
    #[instrument(skip(self))]
    pub async fn allocate(&self, kind: &str) -> Result<String, StoreError> {
        let mut collisions = 0u32;

        loop {
            let id = random_id(self.length);
            if !self.store.exists(&record_key(kind, &id)).await? {
                if collisions > 0 {
                    debug!(kind, collisions, "allocated id after collisions");
                }
                metrics::record_allocation(kind, collisions);
                return Ok(id);
            }

            collisions += 1;
            if collisions % CONGESTION_LOG_INTERVAL == 0 {
                warn!(kind, collisions, length = self.length, "id space congested");
            }
        }
    }
}

fn random_id(length: usize) -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}
