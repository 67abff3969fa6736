// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Write path: flatten one entity into a plan of hash-field writes and
//! index-set additions, then apply it to the store.
//!
//! Plans are computed synchronously under short read locks so no entity
//! lock is ever held across a store round trip. Applying a plan is a blind
//! overwrite: every field is rewritten on every edit, index additions are
//! idempotent, and nothing is rolled back if a round trip fails midway —
//! the record is then partially updated and the caller sees the error.

use tracing::instrument;

use super::{
    index_key, record_key, wire, CLIENT_INVOICES, CLIENT_KIND, INVOICE_KIND, PATH_INVOICES,
    PATH_KIND, ROUTE_CLIENTS, ROUTE_KIND,
};
use crate::model::{Client, Invoice, InvoiceParent, Path, Record, Route};
use crate::store::{KvStore, StoreError};

/// Everything one `edit` will send to the store.
#[derive(Debug)]
pub(crate) struct WritePlan {
    pub key: String,
    pub fields: Vec<(&'static str, String)>,
    /// `(set key, member)` pairs for every reverse index this entity
    /// currently participates in.
    pub index_adds: Vec<(String, String)>,
}

/// Flatten `record` into a plan, dispatching on its kind.
pub(crate) fn plan(record: &Record) -> Result<WritePlan, StoreError> {
    match record {
        Record::Path(p) => Ok(plan_path(&p.read())),
        Record::Route(r) => Ok(plan_route(&r.read())),
        Record::Client(c) => plan_client(&c.read()),
        Record::Invoice(i) => plan_invoice(&i.read()),
    }
}

/// Send a plan to the store, field by field, then the index additions.
#[instrument(skip(store, plan), fields(key = %plan.key))]
pub(crate) async fn apply<S: KvStore>(store: &S, plan: &WritePlan) -> Result<(), StoreError> {
    for (field, value) in &plan.fields {
        store.hash_set(&plan.key, field, value).await?;
    }
    for (set_key, member) in &plan.index_adds {
        store.set_add(set_key, member).await?;
    }
    Ok(())
}

fn plan_path(path: &Path) -> WritePlan {
    let fields = vec![
        ("URL", path.url.clone()),
        ("Fee", path.fee.to_string()),
        ("MaxInvoices", path.max_invoices.to_string()),
        ("Mode", path.mode.clone()),
        ("Period", path.time_period.clone()),
        ("Token", path.token.clone()),
        (
            "LocalExpirationTime",
            wire::encode_time(&path.local_expiration_time),
        ),
        (
            "SyncExpirationTime",
            wire::encode_time(&path.sync_expiration_time),
        ),
    ];

    // Full re-sync of the reverse index from the in-memory collection.
    let set_key = index_key(PATH_INVOICES, &path.id);
    let index_adds = path
        .invoices
        .values()
        .map(|inv| (set_key.clone(), inv.read().id.clone()))
        .collect();

    WritePlan {
        key: record_key(PATH_KIND, &path.id),
        fields,
        index_adds,
    }
}

fn plan_route(route: &Route) -> WritePlan {
    let fields = vec![
        ("Name", route.name.clone()),
        ("Fee", route.fee.to_string()),
        ("MaxInvoices", route.max_invoices.to_string()),
        ("Mode", route.mode.clone()),
        ("Period", route.period.clone()),
    ];

    let set_key = index_key(ROUTE_CLIENTS, &route.id);
    let index_adds = route
        .clients
        .values()
        .map(|c| (set_key.clone(), c.read().id.clone()))
        .collect();

    WritePlan {
        key: record_key(ROUTE_KIND, &route.id),
        fields,
        index_adds,
    }
}

fn plan_client(client: &Client) -> Result<WritePlan, StoreError> {
    let key = record_key(CLIENT_KIND, &client.id);

    let route = client
        .route
        .upgrade()
        .ok_or_else(|| StoreError::DanglingParent { key: key.clone() })?;
    let route_id = route.read().id.clone();

    let fields = vec![
        ("Token", client.token.clone()),
        (
            "ExpirationTime",
            wire::encode_time(&client.expiration_time),
        ),
        ("Route", route_id.clone()),
    ];

    let invoice_set = index_key(CLIENT_INVOICES, &client.id);
    let mut index_adds: Vec<(String, String)> = client
        .invoices
        .values()
        .map(|inv| (invoice_set.clone(), inv.read().id.clone()))
        .collect();
    // Forward pointer and reverse membership are both maintained here.
    index_adds.push((index_key(ROUTE_CLIENTS, &route_id), client.id.clone()));

    Ok(WritePlan {
        key,
        fields,
        index_adds,
    })
}

fn plan_invoice(invoice: &Invoice) -> Result<WritePlan, StoreError> {
    let key = record_key(INVOICE_KIND, &invoice.id);

    let fields = vec![
        ("PaymentRequest", invoice.payment_request.clone()),
        ("PaymentHash", wire::encode_bytes(&invoice.payment_hash)),
        ("PreImage", wire::encode_bytes(&invoice.pre_image)),
        ("Fee", invoice.fee.to_string()),
        ("Settled", wire::encode_bool(invoice.settled)),
        ("Claimed", wire::encode_bool(invoice.claimed)),
        (
            "ExpirationTime",
            wire::encode_time(&invoice.expiration_time),
        ),
    ];

    // Exactly one index set per parent; a detached invoice gets none.
    let index_adds = match &invoice.parent {
        InvoiceParent::Client(weak) => {
            let client = weak
                .upgrade()
                .ok_or_else(|| StoreError::DanglingParent { key: key.clone() })?;
            let client_id = client.read().id.clone();
            vec![(index_key(CLIENT_INVOICES, &client_id), invoice.id.clone())]
        }
        InvoiceParent::Path(weak) => {
            let path = weak
                .upgrade()
                .ok_or_else(|| StoreError::DanglingParent { key: key.clone() })?;
            let path_id = path.read().id.clone();
            vec![(index_key(PATH_INVOICES, &path_id), invoice.id.clone())]
        }
        InvoiceParent::Detached => Vec::new(),
    };

    Ok(WritePlan {
        key,
        fields,
        index_adds,
    })
}
