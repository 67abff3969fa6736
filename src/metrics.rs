// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Metrics instrumentation.
//!
//! Uses the `metrics` crate for backend-agnostic collection; the embedding
//! application chooses the exporter (Prometheus, OTEL, etc.)
//!
//! # Metric Naming Convention
//! - `lightauth_store_` prefix for all metrics
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Labels
//! - `kind`: Path, Route, Client, Invoice
//! - `operation`: create, edit, client_data, server_data
//! - `status`: success, error

use metrics::{counter, histogram};
use std::time::{Duration, Instant};

/// Record one public-surface operation outcome.
pub fn record_operation(operation: &'static str, status: &'static str) {
    counter!(
        "lightauth_store_operations_total",
        "operation" => operation,
        "status" => status
    )
    .increment(1);
}

/// Record operation latency.
pub fn record_latency(operation: &'static str, duration: Duration) {
    histogram!(
        "lightauth_store_operation_seconds",
        "operation" => operation
    )
    .record(duration.as_secs_f64());
}

/// Record an ID allocation and how many collisions it took.
pub fn record_allocation(kind: &str, collisions: u32) {
    counter!(
        "lightauth_store_allocations_total",
        "kind" => kind.to_string()
    )
    .increment(1);
    if collisions > 0 {
        counter!(
            "lightauth_store_allocation_collisions_total",
            "kind" => kind.to_string()
        )
        .increment(u64::from(collisions));
    }
}

/// Record how many root records a bulk reconstruction touched.
pub fn record_reconstruction(root: &'static str, records: usize) {
    histogram!(
        "lightauth_store_reconstruction_records",
        "root" => root
    )
    .record(records as f64);
}

/// A timing guard that records latency on drop.
pub struct LatencyTimer {
    operation: &'static str,
    start: Instant,
}

impl LatencyTimer {
    pub fn new(operation: &'static str) -> Self {
        Self {
            operation,
            start: Instant::now(),
        }
    }
}

impl Drop for LatencyTimer {
    fn drop(&mut self) {
        record_latency(self.operation, self.start.elapsed());
    }
}
