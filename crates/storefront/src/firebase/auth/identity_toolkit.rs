//! Firebase Authentication via the Identity Toolkit REST API.
//!
//! - `POST {endpoint}/accounts:signUp?key={api_key}`
//! - `POST {endpoint}/accounts:signInWithPassword?key={api_key}`
//!
//! Both take `{email, password, returnSecureToken}` and answer with the
//! account's `localId` and `email`. Failures carry
//! `{"error": {"code": 400, "message": "EMAIL_EXISTS"}}`.

use std::sync::Arc;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use url::Url;

use moon_bling_core::{Email, UserId};

use super::{AuthError, AuthProvider, AuthUser};
use crate::config::FirebaseConfig;

/// Identity Toolkit client.
#[derive(Clone)]
pub struct IdentityToolkitClient {
    inner: Arc<IdentityToolkitInner>,
}

struct IdentityToolkitInner {
    client: reqwest::Client,
    endpoint: Url,
    api_key: SecretString,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountResponse {
    local_id: String,
    email: String,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

impl IdentityToolkitClient {
    /// Create a client sharing the given HTTP client.
    #[must_use]
    pub fn new(config: &FirebaseConfig, client: reqwest::Client) -> Self {
        Self {
            inner: Arc::new(IdentityToolkitInner {
                client,
                endpoint: config.auth_endpoint.clone(),
                api_key: config.api_key.clone(),
            }),
        }
    }

    fn method_url(&self, method: &str) -> Result<Url, AuthError> {
        // "./" keeps `accounts:` from parsing as a URL scheme
        let mut url = self
            .inner
            .endpoint
            .join(&format!("./{method}"))
            .map_err(|e| AuthError::UnexpectedResponse(format!("invalid endpoint: {e}")))?;
        url.query_pairs_mut()
            .append_pair("key", self.inner.api_key.expose_secret());
        Ok(url)
    }

    async fn call(
        &self,
        method: &str,
        email: &str,
        password: &SecretString,
    ) -> Result<AuthUser, AuthError> {
        let body = PasswordRequest {
            email: email.trim(),
            password: password.expose_secret(),
            return_secure_token: true,
        };

        let response = self
            .inner
            .client
            .post(self.method_url(method)?)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let response_text = response.text().await?;

        if !status.is_success() {
            return Err(match serde_json::from_str::<ErrorEnvelope>(&response_text) {
                Ok(envelope) => {
                    tracing::debug!(
                        status = %status,
                        code = %envelope.error.message,
                        "Identity Toolkit rejected request"
                    );
                    AuthError::from_provider_message(&envelope.error.message)
                }
                Err(_) => {
                    tracing::error!(
                        status = %status,
                        body = %response_text.chars().take(500).collect::<String>(),
                        "Identity Toolkit returned non-success status"
                    );
                    AuthError::UnexpectedResponse(format!("HTTP {status}"))
                }
            });
        }

        let account: AccountResponse = serde_json::from_str(&response_text).map_err(|e| {
            tracing::error!(error = %e, "Failed to parse Identity Toolkit response");
            AuthError::UnexpectedResponse(e.to_string())
        })?;

        account_to_user(account)
    }
}

fn account_to_user(account: AccountResponse) -> Result<AuthUser, AuthError> {
    let id = UserId::parse(&account.local_id)
        .map_err(|e| AuthError::UnexpectedResponse(format!("localId: {e}")))?;
    let email = Email::parse(&account.email)
        .map_err(|e| AuthError::UnexpectedResponse(format!("email: {e}")))?;
    Ok(AuthUser { id, email })
}

#[async_trait]
impl AuthProvider for IdentityToolkitClient {
    #[instrument(skip(self, password))]
    async fn sign_up(&self, email: &str, password: &SecretString) -> Result<AuthUser, AuthError> {
        self.call("accounts:signUp", email, password).await
    }

    #[instrument(skip(self, password))]
    async fn sign_in(&self, email: &str, password: &SecretString) -> Result<AuthUser, AuthError> {
        self.call("accounts:signInWithPassword", email, password)
            .await
    }
}
