//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                              - Home page (?section=<id>&expand=<collection>)
//! GET  /health                        - Health check
//!
//! # Auth (rate limited)
//! GET  /auth/login                    - Login / sign up page
//! POST /auth/login                    - Sign in
//! POST /auth/signup                   - Sign up
//! POST /auth/logout                   - Sign out, back to `next`
//!
//! # Cart (signed-in users)
//! POST /cart/add                      - Add a product card to the cart
//! GET  /cart/count/stream             - Cart badge (SSE, event `cart-count`)
//! GET  /cart/items/stream             - Cart rows and totals (SSE, event `cart-items`)
//! POST /cart/items/{key}/quantity     - Increment / decrement one entry
//! POST /cart/items/{key}/delete       - Remove one entry
//!
//! # Checkout (signed-in users)
//! GET  /checkout                      - Cart and shipping form
//! POST /checkout                      - Place the order
//! ```

pub mod auth;
pub mod cart;
pub mod checkout;
pub mod home;

use axum::{
    Router,
    routing::{get, post},
};
use tower_sessions::Session;

use crate::middleware::auth_rate_limiter;
use crate::models::Flash;
use crate::state::AppState;
use crate::views::{GateView, Page, RevealConfig, cart_count_label};

/// A navigation menu entry.
#[derive(Debug, Clone)]
pub struct NavLink {
    pub id: String,
    pub title: String,
}

/// Everything the shared layout (`base.html`) renders around a page.
pub struct PageChrome {
    pub gate: GateView,
    /// Path reloaded after signing out.
    pub page_path: &'static str,
    /// Whether navigation swaps sections in place (home page) or links home.
    pub on_home: bool,
    pub nav: Vec<NavLink>,
    pub flashes: Vec<Flash>,
    pub reveal: RevealConfig,
    /// Badge text until the count stream delivers the first value.
    pub cart_label: String,
}

impl PageChrome {
    /// Chrome for `page` under an already evaluated gate. Takes pending
    /// alerts, so only call this when the page is actually rendered.
    pub async fn new(state: &AppState, session: &Session, page: Page, gate: GateView) -> Self {
        Self {
            gate,
            page_path: page.path(),
            on_home: page == Page::Home,
            nav: state
                .catalog()
                .sections
                .iter()
                .map(|section| NavLink {
                    id: section.id.clone(),
                    title: section.title.clone(),
                })
                .collect(),
            flashes: Flash::take_all(session).await,
            reveal: state.reveal(),
            cart_label: cart_count_label(0),
        }
    }
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/signup", post(auth::signup))
        .route("/logout", post(auth::logout))
        .layer(auth_rate_limiter())
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/add", post(cart::add))
        .route("/count/stream", get(cart::count_stream))
        .route("/items/stream", get(cart::items_stream))
        .route("/items/{key}/quantity", post(cart::change_quantity))
        .route("/items/{key}/delete", post(cart::remove))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Home page (section router)
        .route("/", get(home::home))
        // Cart routes
        .nest("/cart", cart_routes())
        // Checkout
        .route("/checkout", get(checkout::show).post(checkout::place_order))
        // Auth routes
        .nest("/auth", auth_routes())
}
