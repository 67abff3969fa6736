//! Graph codec: the bidirectional mapping between the in-memory entity
//! graph and flat store records.
//!
//! # Record layout
//!
//! Every entity flattens to one hash record under `Kind:ID`; every
//! parent→children relationship is mirrored in a reverse index set under
//! `Relation:ParentID`:
//!
//! ```text
//! Path:p1            {URL, Fee, MaxInvoices, Mode, Period, Token,
//!                     LocalExpirationTime, SyncExpirationTime}
//! PathInvoices:p1    {i1}
//!
//! Route:r1           {Name, Fee, MaxInvoices, Mode, Period}
//! RouteClients:r1    {c1}
//! Client:c1          {Token, ExpirationTime, Route}
//! ClientInvoices:c1  {i2}
//!
//! Invoice:i1         {PaymentRequest, PaymentHash, PreImage, Fee,
//!                     Settled, Claimed, ExpirationTime}
//! ```
//!
//! The forward pointer (Client's `Route` field; an Invoice's parent via
//! which set lists it) and the reverse set are both rewritten on every
//! write. Reconstruction trusts the reverse sets for "which children
//! exist" and rebuilds the in-memory back-references from them.

pub mod read;
pub mod wire;
pub mod write;

pub(crate) const PATH_KIND: &str = "Path";
pub(crate) const ROUTE_KIND: &str = "Route";
pub(crate) const CLIENT_KIND: &str = "Client";
pub(crate) const INVOICE_KIND: &str = "Invoice";

pub(crate) const PATH_INVOICES: &str = "PathInvoices";
pub(crate) const CLIENT_INVOICES: &str = "ClientInvoices";
pub(crate) const ROUTE_CLIENTS: &str = "RouteClients";

/// `Kind:ID` — the hash record key for one entity.
pub(crate) fn record_key(kind: &str, id: &str) -> String {
    format!("{}:{}", kind, id)
}

/// `Relation:ParentID` — the reverse index set key for one relationship.
pub(crate) fn index_key(relation: &str, parent_id: &str) -> String {
    format!("{}:{}", relation, parent_id)
}
