//! In-process authentication for development and tests.
//!
//! Accounts live in memory and vanish on restart. Validation mirrors the
//! hosted provider: emails are case-insensitive, passwords need six
//! characters, and failed sign-ins do not reveal whether the email exists.

use std::collections::HashMap;

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use async_trait::async_trait;
use rand::Rng;
use rand::distr::Alphanumeric;
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::RwLock;
use tracing::instrument;

use moon_bling_core::{Email, UserId};

use super::{AuthError, AuthProvider, AuthUser, MIN_PASSWORD_LENGTH};

/// Length of generated user ids (matches Firebase uids).
const UID_LENGTH: usize = 28;

struct Account {
    user: AuthUser,
    password_hash: String,
}

/// In-memory [`AuthProvider`].
pub struct MemoryAuth {
    accounts: RwLock<HashMap<String, Account>>,
    hasher: Argon2<'static>,
}

impl Default for MemoryAuth {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryAuth {
    /// Create an empty account store.
    #[must_use]
    pub fn new() -> Self {
        // Light parameters: accounts are throwaway and tests hash often
        let params = Params::new(Params::MIN_M_COST * 8, 1, 1, None).unwrap_or_default();
        Self {
            accounts: RwLock::new(HashMap::new()),
            hasher: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        }
    }

    /// Number of registered accounts.
    pub async fn len(&self) -> usize {
        self.accounts.read().await.len()
    }

    /// Whether no account has been registered.
    pub async fn is_empty(&self) -> bool {
        self.accounts.read().await.is_empty()
    }

    fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        self.hasher
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|_| AuthError::PasswordHash)
    }

    fn verify_password(&self, password: &str, hash: &str) -> Result<(), AuthError> {
        let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
        self.hasher
            .verify_password(password.as_bytes(), &parsed_hash)
            .map_err(|_| AuthError::InvalidCredentials)
    }
}

/// Parse and lower-case an email the way the provider stores it.
fn normalize_email(email: &str) -> Result<Email, AuthError> {
    Email::parse(&email.to_lowercase()).map_err(|_| AuthError::InvalidEmail)
}

fn generate_uid() -> Result<UserId, AuthError> {
    let uid: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(UID_LENGTH)
        .map(char::from)
        .collect();
    UserId::parse(&uid).map_err(|e| AuthError::UnexpectedResponse(e.to_string()))
}

#[async_trait]
impl AuthProvider for MemoryAuth {
    #[instrument(skip(self, password))]
    async fn sign_up(&self, email: &str, password: &SecretString) -> Result<AuthUser, AuthError> {
        let email = normalize_email(email)?;
        let password = password.expose_secret();
        if password.is_empty() {
            return Err(AuthError::MissingPassword);
        }
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(AuthError::WeakPassword);
        }

        let password_hash = self.hash_password(password)?;

        let mut accounts = self.accounts.write().await;
        if accounts.contains_key(email.as_str()) {
            return Err(AuthError::EmailExists);
        }

        let user = AuthUser {
            id: generate_uid()?,
            email,
        };
        accounts.insert(
            user.email.as_str().to_string(),
            Account {
                user: user.clone(),
                password_hash,
            },
        );

        tracing::info!(user_id = %user.id, "Account created");
        Ok(user)
    }

    #[instrument(skip(self, password))]
    async fn sign_in(&self, email: &str, password: &SecretString) -> Result<AuthUser, AuthError> {
        let email = normalize_email(email)?;
        let password = password.expose_secret();
        if password.is_empty() {
            return Err(AuthError::MissingPassword);
        }

        let accounts = self.accounts.read().await;
        let account = accounts
            .get(email.as_str())
            .ok_or(AuthError::InvalidCredentials)?;
        self.verify_password(password, &account.password_hash)?;

        Ok(account.user.clone())
    }
}
