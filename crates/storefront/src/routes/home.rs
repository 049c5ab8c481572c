//! Home page route handler.
//!
//! The home page hosts every catalog section; the section router decides
//! which one is visible. Navigation links are htmx requests that receive
//! only the sections fragment, so switching sections never reloads the page.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::PageChrome;
use crate::filters;
use crate::middleware::{OptionalAuth, is_htmx};
use crate::state::AppState;
use crate::views::{Page, RouterView, SectionRouter, evaluate};

/// Section router query.
#[derive(Debug, Default, Deserialize)]
pub struct SectionQuery {
    pub section: Option<String>,
    /// Collection whose "View all" was used.
    pub expand: Option<String>,
}

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub chrome: PageChrome,
    pub router: RouterView,
}

/// Sections fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/sections.html")]
pub struct SectionsTemplate {
    pub router: RouterView,
}

/// Display the home page, or only its sections for htmx navigation.
///
/// Signed-out visitors get the page chrome without sections; their htmx
/// navigation swaps nothing.
#[instrument(skip(state, session, headers, user))]
pub async fn home(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<SectionQuery>,
) -> Response {
    let gate = evaluate(Page::Home, user.as_ref());
    let router = SectionRouter::new(state.catalog())
        .show(query.section.as_deref(), query.expand.as_deref());

    if is_htmx(&headers) {
        if !gate.show_content {
            return StatusCode::NO_CONTENT.into_response();
        }
        return SectionsTemplate { router }.into_response();
    }

    HomeTemplate {
        chrome: PageChrome::new(&state, &session, Page::Home, gate).await,
        router,
    }
    .into_response()
}
