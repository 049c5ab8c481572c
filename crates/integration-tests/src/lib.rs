//! Integration tests for Moon Bling.
//!
//! Each test spawns the complete storefront router on an ephemeral port,
//! backed by the in-memory auth provider and realtime database, and drives
//! it over HTTP with a cookie-keeping `reqwest` client.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p moon-bling-integration-tests
//! ```

#![allow(clippy::missing_panics_doc, clippy::unwrap_used)]

use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Response, redirect};
use serde_json::Value;
use tokio::task::JoinHandle;

use moon_bling_core::UserId;
use moon_bling_storefront::catalog::Catalog;
use moon_bling_storefront::config::{Backend, StorefrontConfig};
use moon_bling_storefront::firebase::{MemoryAuth, MemoryDatabase};
use moon_bling_storefront::state::AppState;

/// Catalog used by every test app.
pub const TEST_CATALOG: &str = r#"{
    "sections": [
        { "id": "home", "title": "Moon Bling", "hero": true, "tagline": "Jewellery that glows" },
        { "id": "shop", "title": "Shop", "collections": ["rings"] },
        { "id": "about", "title": "About", "body": ["Handmade under a full moon."] }
    ],
    "collections": [
        { "id": "rings", "title": "Rings", "featured": 2, "products": [
            { "name": "Crescent Ring", "price": "Rs. 1,200", "image": "/static/images/crescent-ring.jpeg" },
            { "name": "Halo Ring", "price": "Rs. 950", "image": "/static/images/halo-ring.jpeg" },
            { "name": "Eclipse Band", "price": "Rs. 1,450", "image": "/static/images/eclipse-band.jpeg" }
        ] }
    ]
}"#;

/// Password accepted by the in-memory provider.
pub const PASSWORD: &str = "moonlight-42";

/// A running storefront plus handles on its backends.
pub struct TestApp {
    pub base_url: String,
    /// Browser-like client: keeps cookies, does not follow redirects.
    pub client: Client,
    pub auth: Arc<MemoryAuth>,
    pub db: MemoryDatabase,
    server: JoinHandle<()>,
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self.server.abort();
    }
}

fn test_config() -> StorefrontConfig {
    StorefrontConfig {
        host: Ipv4Addr::LOCALHOST.into(),
        port: 0,
        base_url: "http://localhost".to_string(),
        backend: Backend::Memory,
        catalog_path: PathBuf::new(),
        firebase: None,
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 0.0,
        sentry_traces_sample_rate: 0.0,
    }
}

impl TestApp {
    /// Start a storefront on an ephemeral port.
    pub async fn spawn() -> Self {
        let auth = Arc::new(MemoryAuth::new());
        let db = MemoryDatabase::new();
        let state = AppState::with_backends(
            test_config(),
            Catalog::from_json(TEST_CATALOG).unwrap(),
            auth.clone(),
            Arc::new(db.clone()),
        );

        let listener = tokio::net::TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
            .await
            .unwrap();
        let addr = listener.local_addr().unwrap();
        let app = moon_bling_storefront::app(state);
        let server = tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            .unwrap();
        });

        let client = Client::builder()
            .cookie_store(true)
            .redirect(redirect::Policy::none())
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap();

        Self {
            base_url: format!("http://{addr}"),
            client,
            auth,
            db,
            server,
        }
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    pub async fn get(&self, path: &str) -> Response {
        self.client.get(self.url(path)).send().await.unwrap()
    }

    /// GET a page and return its body.
    pub async fn page(&self, path: &str) -> String {
        self.get(path).await.text().await.unwrap()
    }

    pub async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> Response {
        self.client
            .post(self.url(path))
            .form(form)
            .send()
            .await
            .unwrap()
    }

    /// Same as [`post_form`](Self::post_form), as an htmx request.
    pub async fn htmx_post(&self, path: &str, form: &[(&str, &str)]) -> Response {
        self.client
            .post(self.url(path))
            .header("HX-Request", "true")
            .form(form)
            .send()
            .await
            .unwrap()
    }

    pub async fn sign_up(&self, email: &str) -> Response {
        self.post_form("/auth/signup", &[("email", email), ("password", PASSWORD)])
            .await
    }

    pub async fn add_to_cart(&self, name: &str, price: &str) -> Response {
        let image = format!("/static/images/{}.jpeg", name.to_lowercase().replace(' ', "-"));
        self.post_form(
            "/cart/add",
            &[("name", name), ("price", price), ("image", image.as_str())],
        )
        .await
    }

    /// The only user id with a cart.
    pub fn cart_owner(&self) -> Option<UserId> {
        let tree = self.db.snapshot();
        let carts = tree.get("carts")?.as_object()?;
        carts.keys().next().and_then(|id| UserId::parse(id).ok())
    }

    /// The stored cart of `user` (null when empty).
    pub fn cart(&self, user: &UserId) -> Value {
        self.db
            .snapshot()
            .get("carts")
            .and_then(|carts| carts.get(user.as_str()))
            .cloned()
            .unwrap_or(Value::Null)
    }

    /// All stored orders (null when none).
    pub fn orders(&self) -> Value {
        self.db
            .snapshot()
            .get("orders")
            .cloned()
            .unwrap_or(Value::Null)
    }
}

/// Read from an event stream until `needle` has been received.
pub async fn read_stream_until(response: &mut Response, needle: &str) -> String {
    let read = async {
        let mut received = String::new();
        while !received.contains(needle) {
            match response.chunk().await.unwrap() {
                Some(chunk) => received.push_str(&String::from_utf8_lossy(&chunk)),
                None => break,
            }
        }
        received
    };
    match tokio::time::timeout(Duration::from_secs(5), read).await {
        Ok(received) => received,
        Err(_) => panic!("stream never sent {needle:?}"),
    }
}

/// `Location` header of a redirect.
#[must_use]
pub fn location(response: &Response) -> &str {
    response
        .headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}
