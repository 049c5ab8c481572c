//! Cart route handlers.
//!
//! Cart operations use HTMX for in-place updates. The badge and the cart
//! rows are never returned by the mutating handlers; both follow the cart
//! through server-sent event streams, so every change (from this tab or
//! any other) re-renders them.

use std::convert::Infallible;

use askama::Template;
use askama_web::WebTemplate;
use async_stream::stream;
use axum::{
    Form,
    extract::{Path, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{
        IntoResponse, Redirect, Response,
        sse::{Event, KeepAlive, Sse},
    },
};
use futures::{Stream, StreamExt};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use moon_bling_core::{CartItem, PushKey};

use crate::error::{AppError, add_breadcrumb};
use crate::middleware::{LOGIN_PATH, OptionalAuth, RequireAuth, is_htmx};
use crate::models::Flash;
use crate::services::QuantityOp;
use crate::state::AppState;
use crate::views::{CartView, cart_count_label};

/// Alert for add-to-cart attempts without a signed-in user.
pub const LOGIN_REQUIRED_MESSAGE: &str = "Please login to add items to cart!";
/// Alert when the cart write fails.
pub const ADD_FAILED_MESSAGE: &str = "Failed to add item to cart. Please try again.";

/// SSE event carrying the badge fragment.
pub const COUNT_EVENT: &str = "cart-count";
/// SSE event carrying the rows and totals fragment.
pub const ITEMS_EVENT: &str = "cart-items";

// =============================================================================
// Form Types
// =============================================================================

/// Add to cart form data: the values shown on the product card.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub name: String,
    pub price: String,
    pub image: String,
}

/// Quantity control form data.
#[derive(Debug, Deserialize)]
pub struct QuantityForm {
    pub op: QuantityOp,
}

// =============================================================================
// Templates
// =============================================================================

/// Alerts fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/flash.html")]
pub struct FlashTemplate {
    pub flashes: Vec<Flash>,
}

/// Cart badge fragment template.
#[derive(Template)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub label: String,
}

/// Cart rows and totals fragment template.
#[derive(Template)]
#[template(path = "partials/cart_items.html")]
pub struct CartItemsTemplate {
    pub cart: CartView,
}

/// Render a fragment into a named SSE event.
fn fragment_event(name: &'static str, fragment: &impl Template) -> Option<Event> {
    match fragment.render() {
        Ok(html) => Some(Event::default().event(name).data(html)),
        Err(e) => {
            tracing::error!(error = %e, event = name, "Failed to render stream fragment");
            None
        }
    }
}

// =============================================================================
// Routes
// =============================================================================

/// Add a product to the signed-in user's cart.
///
/// Without a user nothing is written: the shopper is alerted and sent to
/// the login page.
#[instrument(skip(state, session, headers, user, form), fields(product = %form.name))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    OptionalAuth(user): OptionalAuth,
    Form(form): Form<AddToCartForm>,
) -> Response {
    let Some(user) = user else {
        Flash::error(LOGIN_REQUIRED_MESSAGE).push(&session).await;
        return if is_htmx(&headers) {
            (
                StatusCode::OK,
                [("hx-redirect", HeaderValue::from_static(LOGIN_PATH))],
            )
                .into_response()
        } else {
            Redirect::to(LOGIN_PATH).into_response()
        };
    };

    let name = form.name.clone();
    let flash = match state
        .carts()
        .add_item(&user.id, CartItem::new(form.name, form.price, form.image))
        .await
    {
        Ok(_) => {
            add_breadcrumb("cart", "Added to cart", Some(&[("product", name.as_str())]));
            Flash::success(format!("{name} added to cart!"))
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to add item to cart");
            Flash::error(ADD_FAILED_MESSAGE)
        }
    };

    if is_htmx(&headers) {
        FlashTemplate {
            flashes: vec![flash],
        }
        .into_response()
    } else {
        flash.push(&session).await;
        Redirect::to("/").into_response()
    }
}

/// Stream the cart badge: the entry count now and after every change.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn count_stream(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let updates = state.carts().watch(&user.id);

    let events = stream! {
        let mut updates = std::pin::pin!(updates);
        while let Some(update) = updates.next().await {
            match update {
                Ok(cart) => {
                    let badge = CartCountTemplate { label: cart_count_label(cart.len()) };
                    if let Some(event) = fragment_event(COUNT_EVENT, &badge) {
                        yield Ok::<_, Infallible>(event);
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Cart count subscription ended");
                    break;
                }
            }
        }
    };

    Sse::new(events).keep_alive(KeepAlive::default())
}

/// Stream the cart rows and totals. A read failure replaces the rows with
/// an inline error and ends the stream.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn items_stream(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let updates = state.carts().watch(&user.id);

    let events = stream! {
        let mut updates = std::pin::pin!(updates);
        while let Some(update) = updates.next().await {
            let (cart, failed) = match update {
                Ok(cart) => (CartView::from_cart(&cart), false),
                Err(e) => {
                    tracing::error!(error = %e, "Cart subscription failed");
                    (CartView::load_error(), true)
                }
            };
            if let Some(event) = fragment_event(ITEMS_EVENT, &CartItemsTemplate { cart }) {
                yield Ok::<_, Infallible>(event);
            }
            if failed {
                break;
            }
        }
    };

    Sse::new(events).keep_alive(KeepAlive::default())
}

/// Response for the row controls: nothing to swap for htmx (the stream
/// re-renders), the checkout page otherwise.
fn control_response(headers: &HeaderMap) -> Response {
    if is_htmx(headers) {
        StatusCode::NO_CONTENT.into_response()
    } else {
        Redirect::to("/checkout").into_response()
    }
}

/// Cart keys arrive in the URL; anything that is not a valid key is the
/// client's mistake.
fn parse_key(key: &str) -> Result<PushKey, AppError> {
    PushKey::parse(key).map_err(|e| AppError::BadRequest(format!("invalid cart key: {e}")))
}

/// Increment or decrement one entry. Write failures are logged only.
#[instrument(skip(state, headers, user), fields(user_id = %user.id))]
pub async fn change_quantity(
    State(state): State<AppState>,
    headers: HeaderMap,
    RequireAuth(user): RequireAuth,
    Path(key): Path<String>,
    Form(form): Form<QuantityForm>,
) -> Result<Response, AppError> {
    let key = parse_key(&key)?;
    if let Err(e) = state.carts().adjust_quantity(&user.id, &key, form.op).await {
        tracing::error!(error = %e, "Failed to update cart quantity");
    }

    Ok(control_response(&headers))
}

/// Remove one entry (confirmed client side). Write failures are logged only.
#[instrument(skip(state, headers, user), fields(user_id = %user.id))]
pub async fn remove(
    State(state): State<AppState>,
    headers: HeaderMap,
    RequireAuth(user): RequireAuth,
    Path(key): Path<String>,
) -> Result<Response, AppError> {
    let key = parse_key(&key)?;
    if let Err(e) = state.carts().remove(&user.id, &key).await {
        tracing::error!(error = %e, "Failed to remove cart item");
    }

    Ok(control_response(&headers))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_rejects_path_escapes() {
        assert!(parse_key("-Nabc123").is_ok());
        assert!(matches!(parse_key("a.b"), Err(AppError::BadRequest(_))));
        assert!(matches!(parse_key("$ref"), Err(AppError::BadRequest(_))));
    }
}
