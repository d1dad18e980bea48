//! End-to-end cart behavior over a live server:
//! 1) resume-or-create is idempotent for one identity, and concurrent
//!    creates for the same identity converge on a single cart,
//! 2) add accumulates, negative deltas drain lines, set-to-zero deletes,
//!    remove is idempotent,
//! 3) the expected-name guard rejects wrong ids with 409,
//! 4) close snapshots the state at close time and the cart becomes
//!    immutable, even when the close races a concurrent add.
//!
//! Requires a reachable Postgres via DATABASE_URL; skips otherwise.

use agent_cart_api::{init_schema, transport, CartService};
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;

const SCARF_ID: i32 = 910001;
const BOOTS_ID: i32 = 910002;

async fn seed_products(pool: &sqlx::PgPool) -> Result<(), sqlx::Error> {
    for (id, name, price, category) in [
        (SCARF_ID, "Red Scarf", 19.99, "accessories"),
        (BOOTS_ID, "Winter Boots", 89.90, "shoes"),
    ] {
        sqlx::query(
            "INSERT INTO products (id, name, price, stock, category) VALUES ($1, $2, $3, 10, $4)
             ON CONFLICT (id) DO UPDATE SET name = EXCLUDED.name, price = EXCLUDED.price",
        )
        .bind(id)
        .bind(name)
        .bind(price)
        .bind(category)
        .execute(pool)
        .await?;
    }
    Ok(())
}

/// Connects to DATABASE_URL, seeds the catalog and serves the router on an
/// ephemeral port. Returns the base URL once the server accepts connections.
async fn spawn_app(
) -> Result<(String, tokio::task::JoinHandle<()>), Box<dyn std::error::Error>> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&std::env::var("DATABASE_URL")?)
        .await?;
    init_schema(&pool).await?;
    seed_products(&pool).await?;

    let state = transport::http::AppState {
        cart_service: Arc::new(CartService::new(pool)),
    };
    let router = transport::http::create_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let base_url = format!("http://{}", addr);
    let server = tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    // Wait for the server to accept connections.
    for _ in 0..30 {
        match tokio::net::TcpStream::connect(addr).await {
            Ok(_) => break,
            Err(_) => tokio::time::sleep(tokio::time::Duration::from_millis(100)).await,
        }
    }
    Ok((base_url, server))
}

fn http_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .build()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_cart_flow() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    if std::env::var("DATABASE_URL").is_err() {
        eprintln!("skipping test_cart_flow: DATABASE_URL not set");
        return Ok(());
    }
    let (base_url, server) = spawn_app().await?;
    let client = http_client()?;

    // Unique identity per run so earlier runs' carts cannot interfere.
    let identity = format!("+549{}", uuid::Uuid::new_v4().simple());

    // --- resume-or-create is idempotent ---
    let created = client
        .post(format!("{}/cart", base_url))
        .json(&json!({ "user_phone": identity }))
        .send()
        .await?;
    assert_eq!(created.status(), 201);
    let created: Value = created.json().await?;
    assert!(created["success"].as_bool().unwrap_or(false));
    assert_eq!(created["data"]["resumed"], false);
    let cart_id = created["data"]["cart_id"].as_str().unwrap().to_string();

    let resumed = client
        .post(format!("{}/cart", base_url))
        .json(&json!({ "user_phone": identity }))
        .send()
        .await?;
    assert_eq!(resumed.status(), 200);
    let resumed: Value = resumed.json().await?;
    assert_eq!(resumed["data"]["resumed"], true);
    assert_eq!(resumed["data"]["cart_id"].as_str().unwrap(), cart_id);

    // --- add with a matching expected name ---
    let added = client
        .post(format!("{}/cart/items", base_url))
        .json(&json!({
            "cart_id": cart_id,
            "product_id": SCARF_ID,
            "quantity": 2,
            "expected_name": "red scarf"
        }))
        .send()
        .await?;
    assert_eq!(added.status(), 200);
    let added: Value = added.json().await?;
    assert_eq!(added["data"]["added"], "Red Scarf");
    assert_eq!(added["data"]["total"], 39.98);

    // --- add accumulates ---
    let added_again: Value = client
        .post(format!("{}/cart/items", base_url))
        .json(&json!({ "cart_id": cart_id, "product_id": SCARF_ID, "quantity": 3 }))
        .send()
        .await?
        .json()
        .await?;
    assert!(added_again["success"].as_bool().unwrap_or(false));

    let cart: Value = client
        .get(format!("{}/cart?id={}", base_url, cart_id))
        .send()
        .await?
        .json()
        .await?;
    let items = cart["data"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["quantity"], 5);
    assert_eq!(cart["data"]["total"], 99.95);

    // --- expected-name mismatch is a 409, nothing is applied ---
    let mismatch = client
        .post(format!("{}/cart/items", base_url))
        .json(&json!({
            "cart_id": cart_id,
            "product_id": BOOTS_ID,
            "expected_name": "socks"
        }))
        .send()
        .await?;
    assert_eq!(mismatch.status(), 409);
    let mismatch: Value = mismatch.json().await?;
    assert_eq!(mismatch["data"]["kind"], "identity_mismatch");
    assert_eq!(mismatch["data"]["canonical_name"], "Winter Boots");

    let cart: Value = client
        .get(format!("{}/cart?id={}", base_url, cart_id))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(cart["data"]["items"].as_array().unwrap().len(), 1);

    // --- set-to-zero deletes the line ---
    let set_zero: Value = client
        .patch(format!("{}/cart/items", base_url))
        .json(&json!({ "cart_id": cart_id, "product_id": SCARF_ID, "quantity": 0 }))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(set_zero["data"]["deleted"], true);

    let cart: Value = client
        .get(format!("{}/cart?id={}", base_url, cart_id))
        .send()
        .await?
        .json()
        .await?;
    assert!(cart["data"]["items"].as_array().unwrap().is_empty());
    assert_eq!(cart["data"]["total"], 0.0);

    // --- set exact quantity creates the line when absent ---
    let set_three: Value = client
        .patch(format!("{}/cart/items", base_url))
        .json(&json!({ "cart_id": cart_id, "product_id": BOOTS_ID, "quantity": 3 }))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(set_three["data"]["quantity"], 3);

    // --- remove is idempotent ---
    let removed: Value = client
        .delete(format!(
            "{}/cart/items?cart_id={}&product_id={}",
            base_url, cart_id, BOOTS_ID
        ))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(removed["data"]["removed"], true);

    let removed_twice: Value = client
        .delete(format!(
            "{}/cart/items?cart_id={}&product_id={}",
            base_url, cart_id, BOOTS_ID
        ))
        .send()
        .await?
        .json()
        .await?;
    assert!(removed_twice["success"].as_bool().unwrap_or(false));
    assert_eq!(removed_twice["data"]["removed"], false);

    // --- close snapshots the state at close time ---
    let _: Value = client
        .post(format!("{}/cart/items", base_url))
        .json(&json!({ "cart_id": cart_id, "product_id": SCARF_ID, "quantity": 2 }))
        .send()
        .await?
        .json()
        .await?;
    let before: Value = client
        .get(format!("{}/cart?id={}", base_url, cart_id))
        .send()
        .await?
        .json()
        .await?;

    let closed = client
        .post(format!("{}/cart/close?cart_id={}", base_url, cart_id))
        .send()
        .await?;
    assert_eq!(closed.status(), 200);
    let closed: Value = closed.json().await?;
    assert_eq!(closed["data"]["status"], "closed");
    assert_eq!(closed["data"]["items"], before["data"]["items"]);
    assert_eq!(closed["data"]["total"], before["data"]["total"]);

    // History survives the close.
    let after: Value = client
        .get(format!("{}/cart?id={}", base_url, cart_id))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(after["data"]["items"], before["data"]["items"]);

    // Mutations against the closed cart are rejected.
    let rejected = client
        .post(format!("{}/cart/items", base_url))
        .json(&json!({ "cart_id": cart_id, "product_id": SCARF_ID, "quantity": 1 }))
        .send()
        .await?;
    assert_eq!(rejected.status(), 409);
    let rejected: Value = rejected.json().await?;
    assert_eq!(rejected["data"]["kind"], "cart_closed");

    // A fresh create for the same identity now yields a new cart.
    let fresh: Value = client
        .post(format!("{}/cart", base_url))
        .json(&json!({ "user_phone": identity }))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(fresh["data"]["resumed"], false);
    assert_ne!(fresh["data"]["cart_id"].as_str().unwrap(), cart_id);

    // --- close with no resolvable reference ---
    let missing = client
        .post(format!("{}/cart/close", base_url))
        .json(&json!({ "cart_id": "no-such-cart" }))
        .send()
        .await?;
    assert_eq!(missing.status(), 400);
    let missing: Value = missing.json().await?;
    assert_eq!(missing["data"]["kind"], "missing_reference");

    server.abort();
    let _ = server.await;
    Ok(())
}

/// Concurrent creates for one fresh identity must all land on the same
/// cart, with exactly one request reporting a fresh cart. The partial
/// unique index on active identities is what makes this hold.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_creates_share_one_cart() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    if std::env::var("DATABASE_URL").is_err() {
        eprintln!("skipping test_concurrent_creates_share_one_cart: DATABASE_URL not set");
        return Ok(());
    }
    let (base_url, server) = spawn_app().await?;
    let client = http_client()?;
    let identity = format!("+549{}", uuid::Uuid::new_v4().simple());

    let mut handles = Vec::new();
    for _ in 0..8 {
        let client = client.clone();
        let url = format!("{}/cart", base_url);
        let body = json!({ "user_phone": identity });
        handles.push(tokio::spawn(async move {
            let resp = client.post(url).json(&body).send().await?;
            let status = resp.status().as_u16();
            let body: Value = resp.json().await?;
            Ok::<(u16, Value), reqwest::Error>((status, body))
        }));
    }

    let mut cart_ids = std::collections::HashSet::new();
    let mut fresh_creates = 0;
    for handle in handles {
        let (status, body) = handle.await??;
        assert!(body["success"].as_bool().unwrap_or(false), "create failed: {body}");
        cart_ids.insert(body["data"]["cart_id"].as_str().unwrap().to_string());
        if body["data"]["resumed"] == false {
            assert_eq!(status, 201);
            fresh_creates += 1;
        } else {
            assert_eq!(status, 200);
        }
    }
    assert_eq!(cart_ids.len(), 1, "concurrent creates split the identity across carts");
    assert_eq!(fresh_creates, 1, "expected exactly one fresh create");

    server.abort();
    let _ = server.await;
    Ok(())
}

/// Negative add deltas drain a line; once the quantity drops to zero or
/// below the row disappears and the cart never shows a non-positive line.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_negative_delta_clears_the_line() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    if std::env::var("DATABASE_URL").is_err() {
        eprintln!("skipping test_negative_delta_clears_the_line: DATABASE_URL not set");
        return Ok(());
    }
    let (base_url, server) = spawn_app().await?;
    let client = http_client()?;

    let created: Value = client
        .post(format!("{}/cart", base_url))
        .json(&json!({}))
        .send()
        .await?
        .json()
        .await?;
    let cart_id = created["data"]["cart_id"].as_str().unwrap().to_string();

    let added: Value = client
        .post(format!("{}/cart/items", base_url))
        .json(&json!({ "cart_id": cart_id, "product_id": SCARF_ID, "quantity": 2 }))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(added["data"]["total"], 39.98);

    // Overshooting below zero removes the line outright.
    let drained = client
        .post(format!("{}/cart/items", base_url))
        .json(&json!({ "cart_id": cart_id, "product_id": SCARF_ID, "quantity": -5 }))
        .send()
        .await?;
    assert_eq!(drained.status(), 200);
    let drained: Value = drained.json().await?;
    assert_eq!(drained["data"]["total"], 0.0);

    let cart: Value = client
        .get(format!("{}/cart?id={}", base_url, cart_id))
        .send()
        .await?
        .json()
        .await?;
    assert!(cart["data"]["items"].as_array().unwrap().is_empty());
    assert_eq!(cart["data"]["total"], 0.0);

    // A partial decrement leaves the remainder in place.
    for quantity in [3, -1] {
        let resp: Value = client
            .post(format!("{}/cart/items", base_url))
            .json(&json!({ "cart_id": cart_id, "product_id": BOOTS_ID, "quantity": quantity }))
            .send()
            .await?
            .json()
            .await?;
        assert!(resp["success"].as_bool().unwrap_or(false));
    }
    let cart: Value = client
        .get(format!("{}/cart?id={}", base_url, cart_id))
        .send()
        .await?
        .json()
        .await?;
    let items = cart["data"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["quantity"], 2);
    assert_eq!(cart["data"]["total"], 179.8);

    server.abort();
    let _ = server.await;
    Ok(())
}

/// An add racing a close must either land before the close snapshot or be
/// rejected with cart_closed; the snapshot and the post-close state always
/// agree. Both statements share the cart row lock, so no interleaving can
/// slip an item into a cart after its close snapshot.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_close_racing_an_add_never_loses_items() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    if std::env::var("DATABASE_URL").is_err() {
        eprintln!("skipping test_close_racing_an_add_never_loses_items: DATABASE_URL not set");
        return Ok(());
    }
    let (base_url, server) = spawn_app().await?;
    let client = http_client()?;

    for _ in 0..12 {
        let created: Value = client
            .post(format!("{}/cart", base_url))
            .json(&json!({}))
            .send()
            .await?
            .json()
            .await?;
        let cart_id = created["data"]["cart_id"].as_str().unwrap().to_string();

        let add_fut = client
            .post(format!("{}/cart/items", base_url))
            .json(&json!({ "cart_id": cart_id, "product_id": SCARF_ID, "quantity": 1 }))
            .send();
        let close_fut = client
            .post(format!("{}/cart/close?cart_id={}", base_url, cart_id))
            .send();
        let (add, closed) = tokio::join!(add_fut, close_fut);
        let add = add?;
        let closed = closed?;

        assert_eq!(closed.status(), 200);
        let closed: Value = closed.json().await?;
        let close_items = closed["data"]["items"].as_array().unwrap().clone();

        if add.status() == 200 {
            // The add won the lock, so the close snapshot includes it.
            assert!(
                close_items.iter().any(|line| line["product_id"] == SCARF_ID),
                "committed add missing from close snapshot: {closed}"
            );
        } else {
            assert_eq!(add.status(), 409);
            let add: Value = add.json().await?;
            assert_eq!(add["data"]["kind"], "cart_closed");
            assert!(close_items.is_empty(), "rejected add left items behind: {closed}");
        }

        let after: Value = client
            .get(format!("{}/cart?id={}", base_url, cart_id))
            .send()
            .await?
            .json()
            .await?;
        assert_eq!(after["data"]["items"], closed["data"]["items"]);
    }

    server.abort();
    let _ = server.await;
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_catalog_endpoints() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    if std::env::var("DATABASE_URL").is_err() {
        eprintln!("skipping test_catalog_endpoints: DATABASE_URL not set");
        return Ok(());
    }
    let (base_url, server) = spawn_app().await?;
    let client = http_client()?;

    // Detail by id.
    let detail = client
        .get(format!("{}/products?id={}", base_url, SCARF_ID))
        .send()
        .await?;
    assert_eq!(detail.status(), 200);
    let detail: Value = detail.json().await?;
    assert_eq!(detail["data"]["name"], "Red Scarf");
    assert_eq!(detail["data"]["price"], 19.99);

    // Unknown id is a 404.
    let missing = client
        .get(format!("{}/products?id=88889999", base_url))
        .send()
        .await?;
    assert_eq!(missing.status(), 404);

    // Search matches on name, capped at 3 hits.
    let hits: Value = client
        .get(format!("{}/products?search=scarf", base_url))
        .send()
        .await?
        .json()
        .await?;
    let hits = hits["data"]["products"].as_array().unwrap().clone();
    assert!(!hits.is_empty() && hits.len() <= 3);
    assert!(hits.iter().any(|h| h["id"] == SCARF_ID));

    // The manifest names every cart tool.
    let manifest: Value = client
        .get(format!("{}/manifest", base_url))
        .send()
        .await?
        .json()
        .await?;
    let tools: Vec<&str> = manifest["data"]["tools"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|t| t["name"].as_str())
        .collect();
    for tool in ["create_cart", "add_to_cart", "update_cart_item", "get_cart", "remove_from_cart", "close_cart"] {
        assert!(tools.contains(&tool), "manifest missing tool {}", tool);
    }

    // Health endpoint pings the database.
    let health = client.get(format!("{}/health", base_url)).send().await?;
    assert_eq!(health.status(), 200);

    server.abort();
    let _ = server.await;
    Ok(())
}
