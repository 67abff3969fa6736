// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Read path: rebuild a complete entity forest from scattered records.
//!
//! Both entry points are full-snapshot scans: enumerate the root kind's
//! record keys by prefix, fetch and parse every field of every reachable
//! record, and rewire the graph using the reverse index sets as the source
//! of truth for which children exist. The first field that is missing or
//! fails to parse aborts the whole reconstruction — a partial graph is
//! never returned.
//!
//! Reads are not isolated from concurrent writers: an index set can name
//! an invoice whose record has not landed yet, which surfaces here as a
//! missing-field error rather than a silently absent child.

use std::collections::HashMap;
use tracing::{debug, instrument};

use super::{
    index_key, record_key, wire, CLIENT_INVOICES, CLIENT_KIND, INVOICE_KIND, PATH_INVOICES,
    PATH_KIND, ROUTE_CLIENTS, ROUTE_KIND,
};
use crate::model::{
    shared, Client, Invoice, Path, Route, SharedPath, SharedRoute,
};
use crate::store::{KvStore, StoreError};

/// Rebuild every Path tree. Result is keyed by URL; if two Path records
/// carry the same URL the last one scanned wins (scan order is undefined).
#[instrument(skip(store))]
pub(crate) async fn load_paths<S: KvStore>(
    store: &S,
) -> Result<HashMap<String, SharedPath>, StoreError> {
    let mut forest = HashMap::new();

    let keys = store.scan_keys(&format!("{}:", PATH_KIND)).await?;
    debug!(paths = keys.len(), "scanned path records");

    for key in keys {
        let Some((_, id)) = key.split_once(':') else {
            continue;
        };

        let path = read_path(store, id).await?;
        let url = path.url.clone();
        let path = shared(path);

        for invoice_id in store.set_members(&index_key(PATH_INVOICES, id)).await? {
            let invoice = read_invoice(store, &invoice_id).await?;
            Path::attach_invoice(&path, invoice);
        }

        forest.insert(url, path);
    }

    Ok(forest)
}

/// Rebuild every Route tree, descending Route → Clients → Invoices.
/// Result is keyed by Name, last-scanned-wins on duplicates.
#[instrument(skip(store))]
pub(crate) async fn load_routes<S: KvStore>(
    store: &S,
) -> Result<HashMap<String, SharedRoute>, StoreError> {
    let mut forest = HashMap::new();

    let keys = store.scan_keys(&format!("{}:", ROUTE_KIND)).await?;
    debug!(routes = keys.len(), "scanned route records");

    for key in keys {
        let Some((_, id)) = key.split_once(':') else {
            continue;
        };

        let route = read_route(store, id).await?;
        let name = route.name.clone();
        let route = shared(route);

        for client_id in store.set_members(&index_key(ROUTE_CLIENTS, id)).await? {
            let client = read_client(store, &client_id).await?;
            let client = Route::attach_client(&route, client);

            for invoice_id in store
                .set_members(&index_key(CLIENT_INVOICES, &client_id))
                .await?
            {
                let invoice = read_invoice(store, &invoice_id).await?;
                Client::attach_invoice(&client, invoice);
            }
        }

        forest.insert(name, route);
    }

    Ok(forest)
}

/// Fetch one field, treating absence as corruption — a record listed in an
/// index (or found by scan) must carry its full field set.
async fn require<S: KvStore>(
    store: &S,
    key: &str,
    field: &'static str,
) -> Result<String, StoreError> {
    store
        .hash_get(key, field)
        .await?
        .ok_or_else(|| StoreError::MissingField {
            key: key.to_string(),
            field: field.to_string(),
        })
}

fn corrupt(key: &str, field: &'static str, reason: String) -> StoreError {
    StoreError::Corrupt {
        key: key.to_string(),
        field: field.to_string(),
        reason,
    }
}

async fn read_path<S: KvStore>(store: &S, id: &str) -> Result<Path, StoreError> {
    let key = record_key(PATH_KIND, id);

    let url = require(store, &key, "URL").await?;
    let fee = wire::decode_u64(&require(store, &key, "Fee").await?)
        .map_err(|e| corrupt(&key, "Fee", e))?;
    let max_invoices = wire::decode_u32(&require(store, &key, "MaxInvoices").await?)
        .map_err(|e| corrupt(&key, "MaxInvoices", e))?;
    let mode = require(store, &key, "Mode").await?;
    let time_period = require(store, &key, "Period").await?;
    let token = require(store, &key, "Token").await?;
    let local_expiration_time =
        wire::decode_time(&require(store, &key, "LocalExpirationTime").await?)
            .map_err(|e| corrupt(&key, "LocalExpirationTime", e))?;
    let sync_expiration_time =
        wire::decode_time(&require(store, &key, "SyncExpirationTime").await?)
            .map_err(|e| corrupt(&key, "SyncExpirationTime", e))?;

    let mut path = Path::new(
        url,
        fee,
        max_invoices,
        mode,
        time_period,
        token,
        local_expiration_time,
        sync_expiration_time,
    );
    path.id = id.to_string();
    Ok(path)
}

async fn read_route<S: KvStore>(store: &S, id: &str) -> Result<Route, StoreError> {
    let key = record_key(ROUTE_KIND, id);

    let name = require(store, &key, "Name").await?;
    let fee = wire::decode_u64(&require(store, &key, "Fee").await?)
        .map_err(|e| corrupt(&key, "Fee", e))?;
    let max_invoices = wire::decode_u32(&require(store, &key, "MaxInvoices").await?)
        .map_err(|e| corrupt(&key, "MaxInvoices", e))?;
    let mode = require(store, &key, "Mode").await?;
    let period = require(store, &key, "Period").await?;

    let mut route = Route::new(name, fee, max_invoices, mode, period);
    route.id = id.to_string();
    Ok(route)
}

/// Read a Client record. The `Route` forward-pointer field is validated as
/// present but the back-reference itself is rewired by the caller from the
/// index set it was discovered through.
async fn read_client<S: KvStore>(store: &S, id: &str) -> Result<Client, StoreError> {
    let key = record_key(CLIENT_KIND, id);

    let token = require(store, &key, "Token").await?;
    let expiration_time = wire::decode_time(&require(store, &key, "ExpirationTime").await?)
        .map_err(|e| corrupt(&key, "ExpirationTime", e))?;
    let _route_id = require(store, &key, "Route").await?;

    let mut client = Client::new(token, expiration_time);
    client.id = id.to_string();
    Ok(client)
}

async fn read_invoice<S: KvStore>(store: &S, id: &str) -> Result<Invoice, StoreError> {
    let key = record_key(INVOICE_KIND, id);

    let payment_request = require(store, &key, "PaymentRequest").await?;
    let payment_hash = wire::decode_bytes(&require(store, &key, "PaymentHash").await?)
        .map_err(|e| corrupt(&key, "PaymentHash", e))?;
    let pre_image = wire::decode_bytes(&require(store, &key, "PreImage").await?)
        .map_err(|e| corrupt(&key, "PreImage", e))?;
    let fee = wire::decode_u64(&require(store, &key, "Fee").await?)
        .map_err(|e| corrupt(&key, "Fee", e))?;
    let settled = wire::decode_bool(&require(store, &key, "Settled").await?)
        .map_err(|e| corrupt(&key, "Settled", e))?;
    let claimed = wire::decode_bool(&require(store, &key, "Claimed").await?)
        .map_err(|e| corrupt(&key, "Claimed", e))?;
    let expiration_time = wire::decode_time(&require(store, &key, "ExpirationTime").await?)
        .map_err(|e| corrupt(&key, "ExpirationTime", e))?;

    let mut invoice = Invoice::new(payment_request, payment_hash, pre_image, fee, expiration_time);
    invoice.id = id.to_string();
    invoice.settled = settled;
    invoice.claimed = claimed;
    Ok(invoice)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::write::{apply, plan};
    use crate::model::{InvoiceParent, Record};
    use crate::store::MemoryKvStore;
    use chrono::{DateTime, FixedOffset};
    use std::sync::Arc;

    fn ts(s: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    async fn persist(store: &MemoryKvStore, record: &Record) {
        apply(store, &plan(record).unwrap()).await.unwrap();
    }

    fn seeded_path(store_id: &str, url: &str) -> SharedPath {
        let mut path = Path::new(
            url,
            10,
            5,
            "strict",
            "daily",
            "tok1",
            ts("2024-01-01T00:00:00Z"),
            ts("2024-06-15T09:30:00+02:00"),
        );
        path.id = store_id.to_string();
        shared(path)
    }

    #[tokio::test]
    async fn path_round_trip_preserves_every_field() {
        let store = MemoryKvStore::new();
        let path = seeded_path("p1", "https://x");
        let mut invoice = Invoice::new(
            "lnbc1",
            vec![0xde, 0xad],
            vec![0xbe, 0xef],
            1,
            ts("2024-02-01T00:00:00Z"),
        );
        invoice.id = "i1".to_string();
        invoice.settled = true;
        let invoice = Path::attach_invoice(&path, invoice);

        let path_record = Record::Path(path);
        persist(&store, &path_record).await;
        persist(&store, &Record::Invoice(invoice)).await;

        let forest = load_paths(&store).await.unwrap();
        assert_eq!(forest.len(), 1);

        let loaded = forest.get("https://x").expect("keyed by URL");
        let p = loaded.read();
        assert_eq!(p.id, "p1");
        assert_eq!(p.fee, 10);
        assert_eq!(p.max_invoices, 5);
        assert_eq!(p.mode, "strict");
        assert_eq!(p.time_period, "daily");
        assert_eq!(p.token, "tok1");
        assert_eq!(
            wire::encode_time(&p.local_expiration_time),
            "2024-01-01T00:00:00Z"
        );
        // Offset survives the round trip exactly.
        assert_eq!(
            wire::encode_time(&p.sync_expiration_time),
            "2024-06-15T09:30:00+02:00"
        );

        let inv = p.invoices.get("dead").expect("keyed by hex hash").read();
        assert_eq!(inv.id, "i1");
        assert_eq!(inv.payment_request, "lnbc1");
        assert_eq!(inv.payment_hash, vec![0xde, 0xad]);
        assert_eq!(inv.pre_image, vec![0xbe, 0xef]);
        assert_eq!(inv.fee, 1);
        assert!(inv.settled);
        assert!(!inv.claimed);
    }

    #[tokio::test]
    async fn reconstructed_invoices_point_at_their_exact_owner() {
        let store = MemoryKvStore::new();
        let path = seeded_path("p1", "https://x");
        for (n, hash) in [(1u8, vec![0x0a]), (2u8, vec![0x0b])] {
            let mut invoice = Invoice::new(
                format!("req{}", n),
                hash,
                vec![n],
                u64::from(n),
                ts("2024-02-01T00:00:00Z"),
            );
            invoice.id = format!("i{}", n);
            let invoice = Path::attach_invoice(&path, invoice);
            persist(&store, &Record::Invoice(invoice)).await;
        }
        persist(&store, &Record::Path(path)).await;

        let forest = load_paths(&store).await.unwrap();
        let loaded = forest.get("https://x").unwrap();

        let guard = loaded.read();
        assert_eq!(guard.invoices.len(), 2);
        for invoice in guard.invoices.values() {
            match &invoice.read().parent {
                InvoiceParent::Path(weak) => {
                    // Identity, not mere equality.
                    assert!(Arc::ptr_eq(&weak.upgrade().unwrap(), loaded));
                }
                other => panic!("expected path parent, got {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn route_forest_descends_two_levels() {
        let store = MemoryKvStore::new();
        let mut route = Route::new("premium", 100, 50, "time", "monthly");
        route.id = "r1".to_string();
        let route = shared(route);
        let mut client = Client::new("tok-abc", ts("2024-03-01T00:00:00Z"));
        client.id = "c1".to_string();
        let client = Route::attach_client(&route, client);
        let mut invoice = Invoice::new("req1", vec![0x0f], vec![0xf0], 2, ts("2024-02-01T00:00:00Z"));
        invoice.id = "i1".to_string();
        let invoice = Client::attach_invoice(&client, invoice);

        let route_record = Record::Route(route);
        let client_record = Record::Client(client);
        persist(&store, &route_record).await;
        persist(&store, &client_record).await;
        persist(&store, &Record::Invoice(invoice)).await;

        let forest = load_routes(&store).await.unwrap();
        let loaded = forest.get("premium").expect("keyed by name");

        let r = loaded.read();
        assert_eq!(r.id, "r1");
        assert_eq!(r.fee, 100);

        let client_handle = r.clients.get("tok-abc").expect("keyed by token");
        let c = client_handle.read();
        assert_eq!(c.id, "c1");
        assert!(Arc::ptr_eq(&c.route.upgrade().unwrap(), loaded));

        let inv = c
            .invoices
            .get("req1")
            .expect("keyed by payment request")
            .read();
        assert_eq!(inv.id, "i1");
        match &inv.parent {
            InvoiceParent::Client(weak) => {
                assert!(Arc::ptr_eq(&weak.upgrade().unwrap(), client_handle));
            }
            other => panic!("expected client parent, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn one_corrupt_invoice_fails_the_whole_read() {
        let store = MemoryKvStore::new();
        let mut route = Route::new("premium", 100, 50, "time", "monthly");
        route.id = "r1".to_string();
        let route = shared(route);
        let mut client = Client::new("tok", ts("2024-03-01T00:00:00Z"));
        client.id = "c1".to_string();
        let client = Route::attach_client(&route, client);

        for n in 1u8..=3 {
            let mut invoice =
                Invoice::new(format!("req{}", n), vec![n], vec![n], 1, ts("2024-02-01T00:00:00Z"));
            invoice.id = format!("i{}", n);
            let invoice = Client::attach_invoice(&client, invoice);
            persist(&store, &Record::Invoice(invoice)).await;
        }
        let route_record = Record::Route(route);
        persist(&store, &route_record).await;
        persist(&store, &Record::Client(client)).await;

        // Corrupt one of the three invoice fees in place.
        store
            .hash_set("Invoice:i2", "Fee", "not-a-number")
            .await
            .unwrap();

        let err = load_routes(&store).await.unwrap_err();
        match err {
            StoreError::Corrupt { key, field, .. } => {
                assert_eq!(key, "Invoice:i2");
                assert_eq!(field, "Fee");
            }
            other => panic!("expected corrupt record, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn index_entry_without_record_is_an_error() {
        let store = MemoryKvStore::new();
        let path = seeded_path("p1", "https://x");
        persist(&store, &Record::Path(path)).await;

        // A concurrent writer registered an invoice whose record never landed.
        store.set_add("PathInvoices:p1", "ghost").await.unwrap();

        let err = load_paths(&store).await.unwrap_err();
        assert!(matches!(err, StoreError::MissingField { ref key, .. } if key == "Invoice:ghost"));
    }

    #[tokio::test]
    async fn duplicate_urls_collapse_to_one_entry() {
        let store = MemoryKvStore::new();
        persist(&store, &Record::Path(seeded_path("p1", "https://same"))).await;
        persist(&store, &Record::Path(seeded_path("p2", "https://same"))).await;

        let forest = load_paths(&store).await.unwrap();
        // Which record wins is undefined; that exactly one survives is not.
        assert_eq!(forest.len(), 1);
        let id = forest.get("https://same").unwrap().read().id.clone();
        assert!(id == "p1" || id == "p2");
    }

    #[tokio::test]
    async fn empty_store_reads_as_empty_forests() {
        let store = MemoryKvStore::new();
        assert!(load_paths(&store).await.unwrap().is_empty());
        assert!(load_routes(&store).await.unwrap().is_empty());
    }
}
