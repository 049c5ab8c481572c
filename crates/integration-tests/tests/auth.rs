//! Sign up, sign in and sign out through the HTTP surface.

#![allow(clippy::unwrap_used)]

use moon_bling_integration_tests::{PASSWORD, TestApp, location};
use reqwest::StatusCode;

#[tokio::test]
async fn test_signed_out_home_hides_content() {
    let app = TestApp::spawn().await;

    let body = app.page("/").await;
    assert!(!body.contains(r#"<main id="content">"#));
    assert!(!body.contains(r#"id="nav-menu""#));
    assert!(!body.contains("sse-connect=\"/cart/count/stream\""));
    assert!(body.contains("Login / Sign Up"));
}

#[tokio::test]
async fn test_sign_up_signs_in_and_redirects_home() {
    let app = TestApp::spawn().await;

    let response = app.sign_up("asha@example.com").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
    assert_eq!(app.auth.len().await, 1);

    let body = app.page("/").await;
    assert!(body.contains(r#"<main id="content">"#));
    assert!(body.contains("sse-connect=\"/cart/count/stream\""));
    assert!(body.contains("Logout"));
    assert!(!body.contains("Login / Sign Up"));
}

#[tokio::test]
async fn test_sign_up_failure_is_alerted_verbatim() {
    let app = TestApp::spawn().await;

    let response = app
        .post_form(
            "/auth/signup",
            &[("email", "asha@example.com"), ("password", "123")],
        )
        .await;
    assert_eq!(location(&response), "/auth/login");

    let body = app.page("/auth/login").await;
    assert!(body.contains(r#"role="alert""#));
    assert!(body.contains("Password should be at least 6 characters"));
    assert!(app.auth.is_empty().await);

    // the alert is shown once
    let body = app.page("/auth/login").await;
    assert!(!body.contains("Password should be at least 6 characters"));
}

#[tokio::test]
async fn test_duplicate_sign_up_is_rejected() {
    let app = TestApp::spawn().await;
    app.sign_up("asha@example.com").await;
    app.post_form("/auth/logout", &[("next", "/")]).await;

    app.sign_up("Asha@Example.com").await;
    let body = app.page("/auth/login").await;
    assert!(body.contains("The email address is already in use by another account."));
    assert_eq!(app.auth.len().await, 1);
}

#[tokio::test]
async fn test_sign_in_after_sign_out() {
    let app = TestApp::spawn().await;
    app.sign_up("asha@example.com").await;

    let response = app
        .post_form("/auth/logout", &[("next", "/checkout")])
        .await;
    assert_eq!(location(&response), "/checkout");

    let wrong = app
        .post_form(
            "/auth/login",
            &[("email", "asha@example.com"), ("password", "not-the-password")],
        )
        .await;
    assert_eq!(location(&wrong), "/auth/login");

    let right = app
        .post_form(
            "/auth/login",
            &[("email", "asha@example.com"), ("password", PASSWORD)],
        )
        .await;
    assert_eq!(location(&right), "/");
    assert!(app.page("/").await.contains("Logout"));
}

#[tokio::test]
async fn test_sign_out_on_home_restores_login_link() {
    let app = TestApp::spawn().await;
    app.sign_up("asha@example.com").await;
    assert!(app.page("/").await.contains(r#"<main id="content">"#));

    let response = app.post_form("/auth/logout", &[("next", "/")]).await;
    assert_eq!(location(&response), "/");

    let body = app.page("/").await;
    assert!(!body.contains(r#"<main id="content">"#));
    assert!(body.contains("Login / Sign Up"));
}

#[tokio::test]
async fn test_logout_ignores_offsite_next() {
    let app = TestApp::spawn().await;
    app.sign_up("asha@example.com").await;

    let response = app
        .post_form("/auth/logout", &[("next", "https://evil.example/")])
        .await;
    assert_eq!(location(&response), "/");
}

#[tokio::test]
async fn test_login_page_redirects_signed_in_users_home() {
    let app = TestApp::spawn().await;
    assert_eq!(app.get("/auth/login").await.status(), StatusCode::OK);

    app.sign_up("asha@example.com").await;
    let response = app.get("/auth/login").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
}

#[tokio::test]
async fn test_checkout_requires_sign_in() {
    let app = TestApp::spawn().await;

    let response = app.get("/checkout").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/auth/login");
}

#[tokio::test]
async fn test_cart_streams_refuse_anonymous_clients() {
    let app = TestApp::spawn().await;
    assert_eq!(
        app.get("/cart/count/stream").await.status(),
        StatusCode::UNAUTHORIZED
    );
    assert_eq!(
        app.get("/cart/items/stream").await.status(),
        StatusCode::UNAUTHORIZED
    );
}
