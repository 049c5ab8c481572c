//! Cart manager: adding, live badge and rows, quantity and delete controls.

#![allow(clippy::unwrap_used)]

use moon_bling_integration_tests::{TestApp, location, read_stream_until};
use reqwest::StatusCode;
use serde_json::{Value, json};

#[tokio::test]
async fn test_add_without_user_alerts_and_never_writes() {
    let app = TestApp::spawn().await;

    let response = app.add_to_cart("Crescent Ring", "Rs. 1,200").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/auth/login");
    assert_eq!(app.db.snapshot(), Value::Null);

    let body = app.page("/auth/login").await;
    assert!(body.contains("Please login to add items to cart!"));
}

#[tokio::test]
async fn test_htmx_add_without_user_redirects_client_side() {
    let app = TestApp::spawn().await;

    let response = app
        .htmx_post(
            "/cart/add",
            &[("name", "Halo Ring"), ("price", "Rs. 950"), ("image", "/h.jpeg")],
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("hx-redirect").unwrap(),
        "/auth/login"
    );
    assert_eq!(app.db.snapshot(), Value::Null);
}

#[tokio::test]
async fn test_add_writes_entry_with_quantity_one() {
    let app = TestApp::spawn().await;
    app.sign_up("asha@example.com").await;

    let response = app.add_to_cart("Crescent Ring", "Rs. 1,200").await;
    assert_eq!(location(&response), "/");
    assert!(app.page("/").await.contains("Crescent Ring added to cart!"));

    let owner = app.cart_owner().unwrap();
    let cart = app.cart(&owner);
    let entries = cart.as_object().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(
        entries.values().next().unwrap(),
        &json!({
            "name": "Crescent Ring",
            "price": "Rs. 1,200",
            "image": "/static/images/crescent-ring.jpeg",
            "quantity": 1
        })
    );
}

#[tokio::test]
async fn test_htmx_add_returns_alert_fragment() {
    let app = TestApp::spawn().await;
    app.sign_up("asha@example.com").await;

    let response = app
        .htmx_post(
            "/cart/add",
            &[("name", "Halo Ring"), ("price", "Rs. 950"), ("image", "/h.jpeg")],
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await.unwrap();
    assert!(body.contains(r#"role="alert""#));
    assert!(body.contains("Halo Ring added to cart!"));
}

#[tokio::test]
async fn test_add_failure_is_alerted() {
    let app = TestApp::spawn().await;
    app.sign_up("asha@example.com").await;
    app.db.set_unavailable(true);

    let response = app
        .htmx_post(
            "/cart/add",
            &[("name", "Halo Ring"), ("price", "Rs. 950"), ("image", "/h.jpeg")],
        )
        .await;
    let body = response.text().await.unwrap();
    assert!(body.contains("Failed to add item to cart. Please try again."));

    app.db.set_unavailable(false);
    assert_eq!(app.db.snapshot(), Value::Null);
}

#[tokio::test]
async fn test_count_stream_counts_entries_not_units() {
    let app = TestApp::spawn().await;
    app.sign_up("asha@example.com").await;

    let mut stream = app.get("/cart/count/stream").await;
    assert_eq!(stream.status(), StatusCode::OK);
    assert!(
        stream.headers()["content-type"]
            .to_str()
            .unwrap()
            .starts_with("text/event-stream")
    );
    let first = read_stream_until(&mut stream, "Cart (0)").await;
    assert!(first.contains("event: cart-count"));

    app.add_to_cart("Crescent Ring", "Rs. 1,200").await;
    read_stream_until(&mut stream, "Cart (1)").await;

    let owner = app.cart_owner().unwrap();
    let key = app.cart(&owner).as_object().unwrap().keys().next().unwrap().clone();
    app.post_form(&format!("/cart/items/{key}/quantity"), &[("op", "increment")])
        .await;
    app.add_to_cart("Halo Ring", "Rs. 950").await;

    // 2 entries, 3 units
    read_stream_until(&mut stream, "Cart (2)").await;
}

#[tokio::test]
async fn test_quantity_controls_floor_at_one() {
    let app = TestApp::spawn().await;
    app.sign_up("asha@example.com").await;
    app.add_to_cart("Crescent Ring", "Rs. 1,200").await;

    let owner = app.cart_owner().unwrap();
    let key = app.cart(&owner).as_object().unwrap().keys().next().unwrap().clone();
    let path = format!("/cart/items/{key}/quantity");

    let response = app.htmx_post(&path, &[("op", "increment")]).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(app.cart(&owner)[&key]["quantity"], json!(2));

    for _ in 0..3 {
        app.htmx_post(&path, &[("op", "decrement")]).await;
    }
    assert_eq!(app.cart(&owner)[&key]["quantity"], json!(1));
}

#[tokio::test]
async fn test_delete_control_removes_entry() {
    let app = TestApp::spawn().await;
    app.sign_up("asha@example.com").await;
    app.add_to_cart("Crescent Ring", "Rs. 1,200").await;
    app.add_to_cart("Halo Ring", "Rs. 950").await;

    let owner = app.cart_owner().unwrap();
    let key = app.cart(&owner).as_object().unwrap().keys().next().unwrap().clone();

    let response = app
        .post_form(&format!("/cart/items/{key}/delete"), &[])
        .await;
    assert_eq!(location(&response), "/checkout");

    let cart = app.cart(&owner);
    assert_eq!(cart.as_object().unwrap().len(), 1);
    assert!(cart.get(&key).is_none());
}

#[tokio::test]
async fn test_controls_on_missing_entry_change_nothing() {
    let app = TestApp::spawn().await;
    app.sign_up("asha@example.com").await;
    app.add_to_cart("Crescent Ring", "Rs. 1,200").await;
    let before = app.db.snapshot();

    let response = app
        .htmx_post("/cart/items/-Nmissing/quantity", &[("op", "increment")])
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(app.db.snapshot(), before);
}

#[tokio::test]
async fn test_items_stream_renders_rows_and_totals() {
    let app = TestApp::spawn().await;
    app.sign_up("asha@example.com").await;

    let mut stream = app.get("/cart/items/stream").await;
    let first = read_stream_until(&mut stream, "Your cart is empty.").await;
    assert!(first.contains("event: cart-items"));

    app.add_to_cart("Crescent Ring", "Rs. 1,200").await;
    let owner = app.cart_owner().unwrap();
    let key = app.cart(&owner).as_object().unwrap().keys().next().unwrap().clone();
    app.post_form(&format!("/cart/items/{key}/quantity"), &[("op", "increment")])
        .await;

    let update = read_stream_until(&mut stream, "Rs. 2,550").await;
    assert!(update.contains(&format!(r#"id="cart-item-{key}""#)));
    assert!(update.contains("Qty: 2"));
    assert!(update.contains("Rs. 2,400"));
    assert!(update.contains("Are you sure you want to remove this item?"));
}

#[tokio::test]
async fn test_items_stream_shows_error_on_read_failure() {
    let app = TestApp::spawn().await;
    app.sign_up("asha@example.com").await;
    app.db.set_unavailable(true);

    let mut stream = app.get("/cart/items/stream").await;
    let body = read_stream_until(&mut stream, "Error loading products. Please try again.").await;
    assert!(!body.contains("Subtotal"));
}

#[tokio::test]
async fn test_controls_reject_malformed_keys() {
    let app = TestApp::spawn().await;
    app.sign_up("asha@example.com").await;

    let response = app.post_form("/cart/items/a.b/delete", &[]).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_items_stream_survives_oversized_prices() {
    let app = TestApp::spawn().await;
    app.sign_up("asha@example.com").await;
    let huge = format!("Rs. 5{}", "0".repeat(28));
    app.add_to_cart("Eclipse Band", &huge).await;
    let owner = app.cart_owner().unwrap();
    let key = app.cart(&owner).as_object().unwrap().keys().next().unwrap().clone();
    app.post_form(&format!("/cart/items/{key}/quantity"), &[("op", "increment")])
        .await;

    let mut stream = app.get("/cart/items/stream").await;
    let body = read_stream_until(&mut stream, "Total:").await;
    assert!(body.contains("Eclipse Band"));
    assert!(body.contains("Qty: 2"));
}
