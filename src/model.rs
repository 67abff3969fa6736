// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! The lightauth entity graph.
//!
//! Four mutable entity kinds form two small trees:
//!
//! ```text
//! Path ──── Invoices        (client side, keyed by hex payment hash)
//! Route ─── Clients ─── Invoices
//!           (by token)  (by payment request)
//! ```
//!
//! Collections own their children as `Arc<RwLock<T>>`; children point back
//! up with `Weak` references, so a fully connected graph never forms a
//! reference-count cycle. An [`Invoice`]'s parent is a sum type — it belongs
//! to a Client or a Path, never both.

use chrono::{DateTime, FixedOffset};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::{Arc, Weak};

pub type Shared<T> = Arc<RwLock<T>>;
pub type SharedPath = Shared<Path>;
pub type SharedRoute = Shared<Route>;
pub type SharedClient = Shared<Client>;
pub type SharedInvoice = Shared<Invoice>;

/// Wrap an entity for shared ownership.
pub fn shared<T>(value: T) -> Shared<T> {
    Arc::new(RwLock::new(value))
}

/// A client-side payment path. Root of one tree; looked up by URL.
#[derive(Debug)]
pub struct Path {
    pub id: String,
    pub url: String,
    pub fee: u64,
    pub max_invoices: u32,
    pub mode: String,
    pub time_period: String,
    pub token: String,
    pub local_expiration_time: DateTime<FixedOffset>,
    pub sync_expiration_time: DateTime<FixedOffset>,
    /// Owned invoices, keyed by lowercase hex payment hash.
    pub invoices: HashMap<String, SharedInvoice>,
}

/// A server-side route. Root of the other tree; looked up by name.
#[derive(Debug)]
pub struct Route {
    pub id: String,
    pub name: String,
    pub fee: u64,
    pub max_invoices: u32,
    pub mode: String,
    pub period: String,
    /// Owned clients, keyed by token.
    pub clients: HashMap<String, SharedClient>,
}

/// A client registered on a route.
#[derive(Debug)]
pub struct Client {
    pub id: String,
    pub token: String,
    pub expiration_time: DateTime<FixedOffset>,
    /// The owning route. Always set on a live graph.
    pub route: Weak<RwLock<Route>>,
    /// Owned invoices, keyed by payment request.
    pub invoices: HashMap<String, SharedInvoice>,
}

/// A lightning invoice, owned by exactly one Client or Path.
#[derive(Debug)]
pub struct Invoice {
    pub id: String,
    pub payment_request: String,
    pub payment_hash: Vec<u8>,
    pub pre_image: Vec<u8>,
    pub fee: u64,
    pub settled: bool,
    pub claimed: bool,
    pub expiration_time: DateTime<FixedOffset>,
    pub parent: InvoiceParent,
}

/// Which collection an invoice belongs to.
///
/// The variants make "both parents" unrepresentable, so the write path can
/// never register an invoice in two index sets.
#[derive(Debug, Clone, Default)]
pub enum InvoiceParent {
    /// Not yet attached anywhere. Written without an index entry.
    #[default]
    Detached,
    Client(Weak<RwLock<Client>>),
    Path(Weak<RwLock<Path>>),
}

impl Path {
    pub fn new(
        url: impl Into<String>,
        fee: u64,
        max_invoices: u32,
        mode: impl Into<String>,
        time_period: impl Into<String>,
        token: impl Into<String>,
        local_expiration_time: DateTime<FixedOffset>,
        sync_expiration_time: DateTime<FixedOffset>,
    ) -> Self {
        Self {
            id: String::new(),
            url: url.into(),
            fee,
            max_invoices,
            mode: mode.into(),
            time_period: time_period.into(),
            token: token.into(),
            local_expiration_time,
            sync_expiration_time,
            invoices: HashMap::new(),
        }
    }

    /// Insert `invoice` into `path`'s collection and point it back at the
    /// path. Returns the shared handle. Keyed by hex payment hash.
    pub fn attach_invoice(path: &SharedPath, mut invoice: Invoice) -> SharedInvoice {
        invoice.parent = InvoiceParent::Path(Arc::downgrade(path));
        let key = hex::encode(&invoice.payment_hash);
        let invoice = shared(invoice);
        path.write().invoices.insert(key, invoice.clone());
        invoice
    }
}

impl Route {
    pub fn new(
        name: impl Into<String>,
        fee: u64,
        max_invoices: u32,
        mode: impl Into<String>,
        period: impl Into<String>,
    ) -> Self {
        Self {
            id: String::new(),
            name: name.into(),
            fee,
            max_invoices,
            mode: mode.into(),
            period: period.into(),
            clients: HashMap::new(),
        }
    }

    /// Insert `client` into `route`'s collection and point it back at the
    /// route. Keyed by token.
    pub fn attach_client(route: &SharedRoute, mut client: Client) -> SharedClient {
        client.route = Arc::downgrade(route);
        let key = client.token.clone();
        let client = shared(client);
        route.write().clients.insert(key, client.clone());
        client
    }
}

impl Client {
    pub fn new(token: impl Into<String>, expiration_time: DateTime<FixedOffset>) -> Self {
        Self {
            id: String::new(),
            token: token.into(),
            expiration_time,
            route: Weak::new(),
            invoices: HashMap::new(),
        }
    }

    /// Insert `invoice` into `client`'s collection and point it back at the
    /// client. Keyed by payment request.
    pub fn attach_invoice(client: &SharedClient, mut invoice: Invoice) -> SharedInvoice {
        invoice.parent = InvoiceParent::Client(Arc::downgrade(client));
        let key = invoice.payment_request.clone();
        let invoice = shared(invoice);
        client.write().invoices.insert(key, invoice.clone());
        invoice
    }
}

impl Invoice {
    pub fn new(
        payment_request: impl Into<String>,
        payment_hash: Vec<u8>,
        pre_image: Vec<u8>,
        fee: u64,
        expiration_time: DateTime<FixedOffset>,
    ) -> Self {
        Self {
            id: String::new(),
            payment_request: payment_request.into(),
            payment_hash,
            pre_image,
            fee,
            settled: false,
            claimed: false,
            expiration_time,
            parent: InvoiceParent::Detached,
        }
    }
}

/// A persistable entity, tagged by kind.
///
/// `create` and `edit` dispatch on the variant; each kind knows its record
/// key, its field list, and which reverse indexes it maintains (see
/// `codec::write`).
#[derive(Clone)]
pub enum Record {
    Path(SharedPath),
    Route(SharedRoute),
    Client(SharedClient),
    Invoice(SharedInvoice),
}

impl Record {
    /// The kind namespace used in record keys (`Kind:ID`).
    pub fn kind(&self) -> &'static str {
        match self {
            Record::Path(_) => "Path",
            Record::Route(_) => "Route",
            Record::Client(_) => "Client",
            Record::Invoice(_) => "Invoice",
        }
    }

    pub fn id(&self) -> String {
        match self {
            Record::Path(p) => p.read().id.clone(),
            Record::Route(r) => r.read().id.clone(),
            Record::Client(c) => c.read().id.clone(),
            Record::Invoice(i) => i.read().id.clone(),
        }
    }

    pub(crate) fn set_id(&self, id: &str) {
        match self {
            Record::Path(p) => p.write().id = id.to_string(),
            Record::Route(r) => r.write().id = id.to_string(),
            Record::Client(c) => c.write().id = id.to_string(),
            Record::Invoice(i) => i.write().id = id.to_string(),
        }
    }
}
