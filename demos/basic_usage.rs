// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Basic lightauth-store usage example.
//!
//! Demonstrates:
//! 1. Connecting to Redis
//! 2. Creating a Path with an Invoice and a Route with a Client
//! 3. Reloading both forests from a cold start
//! 4. Verifying the rebuilt back-references
//!
//! # Prerequisites
//!
//! A local Redis:
//! ```bash
//! docker run --rm -p 6379:6379 redis:7-alpine
//! ```
//!
//! # Run
//!
//! ```bash
//! cargo run --example basic_usage
//! ```

use chrono::DateTime;
use lightauth_store::model::shared;
use lightauth_store::{Client, GraphStore, Invoice, Path, Record, Route, StoreConfig};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Simple logging (no filter for simplicity)
    tracing_subscriber::fmt()
        .with_target(false)
        .compact()
        .init();

    println!("\n╔═══════════════════════════════════════════════════════════════╗");
    println!("║           lightauth-store: Basic Usage Example                ║");
    println!("╚═══════════════════════════════════════════════════════════════╝\n");

    // ─────────────────────────────────────────────────────────────────────────
    // 1. Connect
    // ─────────────────────────────────────────────────────────────────────────
    println!("📦 Connecting to Redis...");

    let config = StoreConfig {
        redis_url: "redis://localhost:6379".into(),
        // Namespace prefix for Redis keys (plays nice with other data)
        key_prefix: Some("lightauth:".into()),
        ..Default::default()
    };
    let db = GraphStore::connect(&config).await?;
    println!("   ✅ Connected!");

    // ─────────────────────────────────────────────────────────────────────────
    // 2. Build and persist a client-side Path tree
    // ─────────────────────────────────────────────────────────────────────────
    println!("\n📝 Creating a Path with one Invoice...");

    let expires = DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z")?;
    let path = shared(Path::new(
        "https://api.example.com/paid",
        10,
        5,
        "strict",
        "daily",
        "tok1",
        expires,
        expires,
    ));
    let path_id = db.create(&Record::Path(path.clone())).await?;
    println!("   └─ Path:{} → {}", path_id, path.read().url);

    let invoice = Path::attach_invoice(
        &path,
        Invoice::new(
            "lnbc10n1...",
            vec![0xde, 0xad],
            vec![0xbe, 0xef],
            1,
            DateTime::parse_from_rfc3339("2024-02-01T00:00:00Z")?,
        ),
    );
    let invoice_id = db.create(&Record::Invoice(invoice)).await?;
    println!("   └─ Invoice:{} (payment hash 'dead')", invoice_id);

    // ─────────────────────────────────────────────────────────────────────────
    // 3. Build and persist a server-side Route tree
    // ─────────────────────────────────────────────────────────────────────────
    println!("\n📝 Creating a Route with one Client...");

    let route = shared(Route::new("premium", 100, 50, "time", "monthly"));
    let route_id = db.create(&Record::Route(route.clone())).await?;
    println!("   └─ Route:{} → {}", route_id, route.read().name);

    let client = Route::attach_client(
        &route,
        Client::new("tok-abc", DateTime::parse_from_rfc3339("2024-03-01T00:00:00Z")?),
    );
    let client_id = db.create(&Record::Client(client)).await?;
    println!("   └─ Client:{} (token 'tok-abc')", client_id);

    // ─────────────────────────────────────────────────────────────────────────
    // 4. Cold-start reload of both forests
    // ─────────────────────────────────────────────────────────────────────────
    println!("\n📖 Reloading everything from the store...");

    let paths = db.client_data().await?;
    println!("   ┌─ client_data: {} path(s)", paths.len());
    for (url, p) in &paths {
        let p = p.read();
        println!("   │  └─ {} (Path:{}, {} invoice(s))", url, p.id, p.invoices.len());
        for (hash, inv) in &p.invoices {
            let inv = inv.read();
            println!(
                "   │     └─ {} fee={} settled={} claimed={}",
                hash, inv.fee, inv.settled, inv.claimed
            );
        }
    }

    let routes = db.server_data().await?;
    println!("   └─ server_data: {} route(s)", routes.len());
    for (name, r) in &routes {
        let r = r.read();
        println!("      └─ {} (Route:{}, {} client(s))", name, r.id, r.clients.len());
        for (token, c) in &r.clients {
            let c = c.read();
            // The rebuilt back-reference points at this exact route instance.
            let wired = c
                .route
                .upgrade()
                .map(|owner| Arc::ptr_eq(&owner, routes.get(name).unwrap()))
                .unwrap_or(false);
            println!("         └─ {} (Client:{}, back-reference ok: {})", token, c.id, wired);
        }
    }

    println!("\n💡 Data remains in Redis - inspect with:");
    println!("   └─ redis-cli KEYS 'lightauth:*'");
    println!("   └─ redis-cli HGETALL lightauth:Path:{}", path_id);
    println!("   └─ redis-cli SMEMBERS lightauth:PathInvoices:{}", path_id);

    println!("\n╔═══════════════════════════════════════════════════════════════╗");
    println!("║                    Example complete!                          ║");
    println!("╚═══════════════════════════════════════════════════════════════╝\n");

    Ok(())
}
