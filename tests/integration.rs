//! Integration tests against real Redis.
//!
//! Tests use testcontainers for portability - no external docker-compose
//! required.
//!
//! # Running Tests
//! ```bash
//! # Requires Docker
//! cargo test --test integration -- --ignored
//! ```

use chrono::{DateTime, FixedOffset};
use std::sync::Arc;

use lightauth_store::model::shared;
use lightauth_store::{
    Client, GraphStore, Invoice, InvoiceParent, KvStore, Path, Record, RedisKvStore, Route,
    StoreError,
};

use testcontainers::{clients::Cli, core::WaitFor, Container, GenericImage};

// =============================================================================
// Container Helpers
// =============================================================================

/// Create a Redis container with health check
fn redis_container(docker: &Cli) -> Container<'_, GenericImage> {
    let image = GenericImage::new("redis", "7-alpine")
        .with_exposed_port(6379)
        .with_wait_for(WaitFor::message_on_stdout("Ready to accept connections"));
    docker.run(image)
}

async fn connect(port: u16) -> RedisKvStore {
    RedisKvStore::connect(&format!("redis://127.0.0.1:{}", port))
        .await
        .expect("Failed to connect to Redis")
}

fn ts(s: &str) -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339(s).unwrap()
}

// =============================================================================
// Happy Path Tests
// =============================================================================

#[tokio::test]
#[ignore] // Requires Docker
async fn happy_path_tree_round_trip() {
    let docker = Cli::default();
    let redis = redis_container(&docker);
    let store = connect(redis.get_host_port_ipv4(6379)).await;
    let db = GraphStore::new(store);

    let path = shared(Path::new(
        "https://x",
        10,
        5,
        "strict",
        "daily",
        "tok1",
        ts("2024-01-01T00:00:00Z"),
        ts("2024-06-15T09:30:00+02:00"),
    ));
    let path_id = db.create(&Record::Path(path.clone())).await.expect("create path");

    let invoice = Path::attach_invoice(
        &path,
        Invoice::new("lnbc1", vec![0xde, 0xad], vec![0xbe, 0xef], 1, ts("2024-02-01T00:00:00Z")),
    );
    db.create(&Record::Invoice(invoice)).await.expect("create invoice");

    let forest = db.client_data().await.expect("client_data");
    let loaded = forest.get("https://x").expect("path keyed by URL");

    let guard = loaded.read();
    assert_eq!(guard.id, path_id);
    assert_eq!(guard.fee, 10);
    assert_eq!(guard.max_invoices, 5);
    // The +02:00 offset survives storage exactly.
    assert_eq!(
        guard.sync_expiration_time.offset().local_minus_utc(),
        2 * 3600
    );

    let inv = guard.invoices.get("dead").expect("keyed by hex hash").read();
    assert_eq!(inv.pre_image, vec![0xbe, 0xef]);
    match &inv.parent {
        InvoiceParent::Path(weak) => {
            assert!(Arc::ptr_eq(&weak.upgrade().unwrap(), loaded));
        }
        other => panic!("expected path parent, got {:?}", other),
    }
}

#[tokio::test]
#[ignore] // Requires Docker
async fn happy_route_tree_two_levels_deep() {
    let docker = Cli::default();
    let redis = redis_container(&docker);
    let store = connect(redis.get_host_port_ipv4(6379)).await;
    let db = GraphStore::new(store);

    let route = shared(Route::new("premium", 100, 50, "time", "monthly"));
    db.create(&Record::Route(route.clone())).await.expect("create route");

    let client = Route::attach_client(&route, Client::new("tok-abc", ts("2024-03-01T00:00:00Z")));
    db.create(&Record::Client(client.clone())).await.expect("create client");

    let invoice = Client::attach_invoice(
        &client,
        Invoice::new("req-1", vec![0x11], vec![0x22], 3, ts("2024-02-01T00:00:00Z")),
    );
    db.create(&Record::Invoice(invoice)).await.expect("create invoice");

    let forest = db.server_data().await.expect("server_data");
    let loaded = forest.get("premium").expect("route keyed by name");

    let r = loaded.read();
    let c = r.clients.get("tok-abc").expect("client keyed by token").read();
    assert!(Arc::ptr_eq(&c.route.upgrade().unwrap(), loaded));
    assert!(c.invoices.contains_key("req-1"));
}

#[tokio::test]
#[ignore] // Requires Docker
async fn happy_edit_is_idempotent_on_indexes() {
    let docker = Cli::default();
    let redis = redis_container(&docker);
    let store = Arc::new(connect(redis.get_host_port_ipv4(6379)).await);
    let db = GraphStore::with_id_length(store.clone(), 16);

    let route = shared(Route::new("basic", 5, 10, "invoice", "weekly"));
    let record = Record::Route(route.clone());
    db.create(&record).await.expect("create route");
    let client = Route::attach_client(&route, Client::new("tok", ts("2024-03-01T00:00:00Z")));
    db.create(&Record::Client(client)).await.expect("create client");

    db.edit(&record).await.expect("first re-edit");
    db.edit(&record).await.expect("second re-edit");

    let route_id = route.read().id.clone();
    let members = store
        .set_members(&format!("RouteClients:{}", route_id))
        .await
        .expect("set members");
    assert_eq!(members.len(), 1);
}

#[tokio::test]
#[ignore] // Requires Docker
async fn happy_allocator_ids_are_distinct_under_concurrency() {
    let docker = Cli::default();
    let redis = redis_container(&docker);
    let store = connect(redis.get_host_port_ipv4(6379)).await;
    let db = Arc::new(GraphStore::new(store));

    let mut handles = Vec::new();
    for n in 0..10 {
        let db = db.clone();
        handles.push(tokio::spawn(async move {
            let route = shared(Route::new(format!("route-{}", n), 1, 1, "time", "daily"));
            db.create(&Record::Route(route)).await.expect("create route")
        }));
    }

    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap());
    }
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 10);
}

#[tokio::test]
#[ignore] // Requires Docker
async fn happy_key_prefix_namespaces_the_instance() {
    let docker = Cli::default();
    let redis = redis_container(&docker);
    let port = redis.get_host_port_ipv4(6379);

    let url = format!("redis://127.0.0.1:{}", port);
    let namespaced = RedisKvStore::with_prefix(&url, Some("lightauth:"))
        .await
        .expect("connect");
    let bare = RedisKvStore::connect(&url).await.expect("connect");

    let db = GraphStore::new(namespaced);
    let path = shared(Path::new(
        "https://ns",
        1,
        1,
        "strict",
        "daily",
        "t",
        ts("2024-01-01T00:00:00Z"),
        ts("2024-01-01T00:00:00Z"),
    ));
    db.create(&Record::Path(path)).await.expect("create path");

    // Visible through the namespaced handle, invisible to a bare scan.
    assert_eq!(db.client_data().await.expect("client_data").len(), 1);
    assert!(bare.scan_keys("Path:").await.expect("scan").is_empty());
}

// =============================================================================
// Failure Scenario Tests
// =============================================================================

#[tokio::test]
#[ignore] // Requires Docker
async fn failure_corrupt_field_aborts_reconstruction() {
    let docker = Cli::default();
    let redis = redis_container(&docker);
    let store = Arc::new(connect(redis.get_host_port_ipv4(6379)).await);
    let db = GraphStore::with_id_length(store.clone(), 16);

    let route = shared(Route::new("premium", 100, 50, "time", "monthly"));
    db.create(&Record::Route(route.clone())).await.expect("create route");
    let client = Route::attach_client(&route, Client::new("tok", ts("2024-03-01T00:00:00Z")));
    db.create(&Record::Client(client.clone())).await.expect("create client");
    for n in 1u8..=3 {
        let invoice = Client::attach_invoice(
            &client,
            Invoice::new(format!("req-{}", n), vec![n], vec![n], 1, ts("2024-02-01T00:00:00Z")),
        );
        db.create(&Record::Invoice(invoice)).await.expect("create invoice");
    }

    // Corrupt one invoice fee by hand.
    let victim = client.read().invoices.get("req-2").unwrap().read().id.clone();
    store
        .hash_set(&format!("Invoice:{}", victim), "Fee", "not-a-number")
        .await
        .expect("corrupt the record");

    match db.server_data().await {
        Err(StoreError::Corrupt { key, field, .. }) => {
            assert_eq!(key, format!("Invoice:{}", victim));
            assert_eq!(field, "Fee");
        }
        other => panic!("expected corrupt-record error, got {:?}", other.map(|m| m.len())),
    }
}

#[tokio::test]
#[ignore] // Requires Docker
async fn failure_unreachable_redis_fails_fast() {
    // Nothing listens on this port; connect should give up after its
    // bounded backoff instead of hanging.
    let result = RedisKvStore::connect("redis://127.0.0.1:59999").await;
    assert!(matches!(result, Err(StoreError::Backend(_))));
}
