//! Authentication route handlers.
//!
//! Handles sign up, sign in and sign out against the configured auth
//! provider. Provider errors are shown to the shopper verbatim as alerts on
//! the login page.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use secrecy::SecretString;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::PageChrome;
use crate::error::add_breadcrumb;
use crate::filters;
use crate::firebase::auth::MIN_PASSWORD_LENGTH;
use crate::firebase::{AuthError, AuthUser};
use crate::middleware::{LOGIN_PATH, OptionalAuth, clear_current_user, set_current_user};
use crate::models::{CurrentUser, Flash};
use crate::state::AppState;
use crate::views::{Page, evaluate};

// =============================================================================
// Form Types
// =============================================================================

/// Sign up and sign in form data.
#[derive(Debug, Deserialize)]
pub struct CredentialsForm {
    pub email: String,
    pub password: String,
}

/// Logout form data.
#[derive(Debug, Default, Deserialize)]
pub struct LogoutForm {
    /// Page to reload after signing out.
    pub next: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Login / sign up page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub chrome: PageChrome,
    pub min_password_length: usize,
}

// =============================================================================
// Routes
// =============================================================================

/// Display the login page. Signed-in users are sent home.
#[instrument(skip(state, session, user))]
pub async fn login_page(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
) -> Response {
    let gate = evaluate(Page::Login, user.as_ref());
    if let Some(target) = gate.redirect {
        return Redirect::to(target).into_response();
    }

    LoginTemplate {
        chrome: PageChrome::new(&state, &session, Page::Login, gate).await,
        min_password_length: MIN_PASSWORD_LENGTH,
    }
    .into_response()
}

/// Handle sign up form submission.
#[instrument(skip(state, session, form))]
pub async fn signup(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CredentialsForm>,
) -> Response {
    let password = SecretString::from(form.password);
    let result = state.auth().sign_up(&form.email, &password).await;
    complete_sign_in(&session, result, "Sign up").await
}

/// Handle sign in form submission.
#[instrument(skip(state, session, form))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CredentialsForm>,
) -> Response {
    let password = SecretString::from(form.password);
    let result = state.auth().sign_in(&form.email, &password).await;
    complete_sign_in(&session, result, "Login").await
}

/// Store the user in the session and go home, or alert the provider's
/// message and go back to the login page.
async fn complete_sign_in(
    session: &Session,
    result: Result<AuthUser, AuthError>,
    action: &str,
) -> Response {
    match result {
        Ok(user) => {
            let user = CurrentUser::from(user);
            if let Err(e) = set_current_user(session, &user).await {
                tracing::error!(error = %e, "Failed to store user in session");
                Flash::error("Something went wrong. Please try again.")
                    .push(session)
                    .await;
                return Redirect::to(LOGIN_PATH).into_response();
            }

            tracing::info!(user_id = %user.id, "{action} succeeded");
            add_breadcrumb("auth", &format!("{action} succeeded"), None);
            Redirect::to("/").into_response()
        }
        Err(e) => {
            if e.is_server_error() {
                tracing::error!(error = %e, "{action} failed");
            } else {
                tracing::warn!(error = %e, "{action} rejected");
            }
            Flash::error(e.to_string()).push(session).await;
            Redirect::to(LOGIN_PATH).into_response()
        }
    }
}

/// Handle logout: clear the session and reload the page the user was on.
#[instrument(skip(session))]
pub async fn logout(session: Session, Form(form): Form<LogoutForm>) -> Response {
    if let Err(e) = clear_current_user(&session).await {
        tracing::error!(error = %e, "Failed to clear session");
    }

    Redirect::to(safe_next(form.next.as_deref())).into_response()
}

/// Only same-site absolute paths are followed after logout.
fn safe_next(next: Option<&str>) -> &str {
    next.filter(|path| path.starts_with('/') && !path.starts_with("//") && !path.contains('\\'))
        .unwrap_or("/")
}
