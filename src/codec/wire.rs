// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Canonical textual forms for stored field values.
//!
//! Everything in a hash record is a string. The forms are fixed:
//!
//! - timestamps: RFC3339 with numeric UTC offset, whole seconds
//!   (`2024-01-01T00:00:00Z`, `2024-06-15T09:30:00+02:00`)
//! - binary: lowercase hex
//! - booleans: the literals `true` / `false`
//! - integers: base-10 decimal
//!
//! Decoders are strict; anything else is a corrupt record.

use chrono::{DateTime, FixedOffset, SecondsFormat};

/// Format a timestamp for storage. The offset is preserved exactly ("Z"
/// for UTC, `±HH:MM` otherwise). Sub-second precision is truncated: the
/// wire carries whole seconds only.
pub(crate) fn encode_time(t: &DateTime<FixedOffset>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub(crate) fn decode_time(s: &str) -> Result<DateTime<FixedOffset>, String> {
    DateTime::parse_from_rfc3339(s).map_err(|e| format!("invalid timestamp '{}': {}", s, e))
}

pub(crate) fn encode_bool(b: bool) -> String {
    b.to_string()
}

pub(crate) fn decode_bool(s: &str) -> Result<bool, String> {
    match s {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(format!("invalid boolean '{}'", other)),
    }
}

pub(crate) fn decode_u64(s: &str) -> Result<u64, String> {
    s.parse::<u64>()
        .map_err(|e| format!("invalid integer '{}': {}", s, e))
}

pub(crate) fn decode_u32(s: &str) -> Result<u32, String> {
    s.parse::<u32>()
        .map_err(|e| format!("invalid integer '{}': {}", s, e))
}

pub(crate) fn encode_bytes(b: &[u8]) -> String {
    hex::encode(b)
}

pub(crate) fn decode_bytes(s: &str) -> Result<Vec<u8>, String> {
    hex::decode(s).map_err(|e| format!("invalid hex '{}': {}", s, e))
}
