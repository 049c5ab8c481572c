//! Email/password authentication.
//!
//! The storefront only needs two provider calls: create an account and sign
//! in to an existing one. Both return the provider's user id and normalised
//! email, which the session layer stores as the current user. Sign-out and
//! the current-user accessor are session operations (see
//! [`crate::middleware::auth`]).

mod identity_toolkit;
mod memory;

use async_trait::async_trait;
use secrecy::SecretString;
use thiserror::Error;

use moon_bling_core::{Email, UserId};

pub use identity_toolkit::IdentityToolkitClient;
pub use memory::MemoryAuth;

/// Minimum password length enforced by Firebase Authentication.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// A user returned by a successful sign-up or sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: UserId,
    pub email: Email,
}

/// Errors from the authentication provider.
///
/// The `Display` text of the provider-side variants is the message shown to
/// the shopper, so it follows the wording of the Firebase client SDKs.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("The email address is already in use by another account.")]
    EmailExists,

    #[error("The email address is badly formatted.")]
    InvalidEmail,

    #[error("Password should be at least 6 characters")]
    WeakPassword,

    #[error("A non-empty password must be provided.")]
    MissingPassword,

    /// Wrong password or unknown email (Firebase no longer distinguishes).
    #[error("The supplied auth credential is incorrect, malformed or has expired.")]
    InvalidCredentials,

    #[error("The user account has been disabled by an administrator.")]
    UserDisabled,

    #[error(
        "Access to this account has been temporarily disabled due to many failed login attempts. Please try again later."
    )]
    TooManyAttempts,

    #[error("Email/password sign-in is not enabled for this project.")]
    OperationNotAllowed,

    /// Any other error code returned by the provider.
    #[error("{0}")]
    Rejected(String),

    /// Transport failure talking to the provider.
    #[error("A network error has occurred. Please try again.")]
    Http(#[from] reqwest::Error),

    /// The provider answered with something we could not interpret.
    #[error("Unexpected response from the authentication service.")]
    UnexpectedResponse(String),

    /// Local password hashing failed.
    #[error("Unable to process the password.")]
    PasswordHash,
}

impl AuthError {
    /// Map an Identity Toolkit error message to an error.
    ///
    /// Messages are either a bare code (`EMAIL_EXISTS`) or a code followed by
    /// a description (`WEAK_PASSWORD : Password should be at least 6
    /// characters`).
    #[must_use]
    pub fn from_provider_message(message: &str) -> Self {
        let (code, detail) = message
            .split_once(" : ")
            .map_or((message.trim(), None), |(code, detail)| {
                (code.trim(), Some(detail.trim()))
            });

        match code {
            "EMAIL_EXISTS" => Self::EmailExists,
            "INVALID_EMAIL" => Self::InvalidEmail,
            "WEAK_PASSWORD" => Self::WeakPassword,
            "MISSING_PASSWORD" => Self::MissingPassword,
            "INVALID_LOGIN_CREDENTIALS" | "INVALID_PASSWORD" | "EMAIL_NOT_FOUND" => {
                Self::InvalidCredentials
            }
            "USER_DISABLED" => Self::UserDisabled,
            "OPERATION_NOT_ALLOWED" | "PASSWORD_LOGIN_DISABLED" => Self::OperationNotAllowed,
            c if c.starts_with("TOO_MANY_ATTEMPTS_TRY_LATER") => Self::TooManyAttempts,
            _ => Self::Rejected(detail.unwrap_or(code).to_string()),
        }
    }

    /// Whether the failure is on our side of the boundary (reported to
    /// Sentry) rather than a rejection of the shopper's input.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Http(_) | Self::UnexpectedResponse(_) | Self::PasswordHash
        )
    }
}

/// Email/password account operations.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Create an account and sign it in.
    async fn sign_up(&self, email: &str, password: &SecretString) -> Result<AuthUser, AuthError>;

    /// Sign in to an existing account.
    async fn sign_in(&self, email: &str, password: &SecretString) -> Result<AuthUser, AuthError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_provider_message_known_codes() {
        assert!(matches!(
            AuthError::from_provider_message("EMAIL_EXISTS"),
            AuthError::EmailExists
        ));
        assert!(matches!(
            AuthError::from_provider_message("WEAK_PASSWORD : Password should be at least 6 characters"),
            AuthError::WeakPassword
        ));
        assert!(matches!(
            AuthError::from_provider_message("INVALID_LOGIN_CREDENTIALS"),
            AuthError::InvalidCredentials
        ));
        assert!(matches!(
            AuthError::from_provider_message(
                "TOO_MANY_ATTEMPTS_TRY_LATER : Access to this account has been temporarily disabled"
            ),
            AuthError::TooManyAttempts
        ));
    }

    #[test]
    fn test_from_provider_message_unknown_code_keeps_detail() {
        let err = AuthError::from_provider_message("QUOTA_EXCEEDED : Exceeded quota for verifying passwords.");
        assert_eq!(err.to_string(), "Exceeded quota for verifying passwords.");

        let err = AuthError::from_provider_message("ADMIN_ONLY_OPERATION");
        assert_eq!(err.to_string(), "ADMIN_ONLY_OPERATION");
    }

    #[test]
    fn test_messages_are_shopper_facing() {
        assert_eq!(
            AuthError::EmailExists.to_string(),
            "The email address is already in use by another account."
        );
        assert_eq!(
            AuthError::WeakPassword.to_string(),
            "Password should be at least 6 characters"
        );
    }

    #[test]
    fn test_server_errors() {
        assert!(AuthError::UnexpectedResponse("no localId".into()).is_server_error());
        assert!(!AuthError::InvalidCredentials.is_server_error());
        assert!(!AuthError::Rejected("x".into()).is_server_error());
    }
}
