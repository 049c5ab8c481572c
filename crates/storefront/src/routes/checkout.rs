//! Checkout route handlers.
//!
//! The checkout page shows the live cart and the shipping form. Placing an
//! order always ends in a redirect with an alert: home on success, back to
//! the checkout page otherwise.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use moon_bling_core::Shipping;

use super::PageChrome;
use crate::error::add_breadcrumb;
use crate::filters;
use crate::middleware::RequireAuth;
use crate::models::Flash;
use crate::services::{CheckoutError, ORDER_PLACED_MESSAGE};
use crate::state::AppState;
use crate::views::{CartView, Page, evaluate};

/// Shipping form data.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ShippingForm {
    pub name: String,
    pub phone: String,
    pub address: String,
    pub city: String,
}

impl From<ShippingForm> for Shipping {
    fn from(form: ShippingForm) -> Self {
        Self {
            name: form.name.trim().to_string(),
            phone: form.phone.trim().to_string(),
            address: form.address.trim().to_string(),
            city: form.city.trim().to_string(),
        }
    }
}

/// Checkout page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout.html")]
pub struct CheckoutTemplate {
    pub chrome: PageChrome,
    /// First render; the items stream takes over once connected.
    pub cart: CartView,
}

/// Display the checkout page.
#[instrument(skip(state, session, user), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
) -> Response {
    let cart = match state.carts().load(&user.id).await {
        Ok(cart) => CartView::from_cart(&cart),
        Err(e) => {
            tracing::error!(error = %e, "Failed to load cart for checkout");
            CartView::load_error()
        }
    };

    let gate = evaluate(Page::Checkout, Some(&user));
    CheckoutTemplate {
        chrome: PageChrome::new(&state, &session, Page::Checkout, gate).await,
        cart,
    }
    .into_response()
}

/// Place the order.
#[instrument(skip(state, session, user, form), fields(user_id = %user.id))]
pub async fn place_order(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Form(form): Form<ShippingForm>,
) -> Response {
    match state.checkout().place_order(&user, form.into()).await {
        Ok(key) => {
            add_breadcrumb("checkout", "Order placed", Some(&[("order", key.as_str())]));
            Flash::success(ORDER_PLACED_MESSAGE).push(&session).await;
            Redirect::to("/").into_response()
        }
        Err(e) => {
            match &e {
                CheckoutError::Database(_) => {
                    let event_id = sentry::capture_error(&e);
                    tracing::error!(error = %e, sentry_event_id = %event_id, "Failed to place order");
                }
                CheckoutError::MissingShipping(_) | CheckoutError::EmptyCart => {
                    tracing::info!(reason = %e, "Order not placed");
                }
            }
            Flash::error(e.user_message()).push(&session).await;
            Redirect::to(Page::Checkout.path()).into_response()
        }
    }
}
