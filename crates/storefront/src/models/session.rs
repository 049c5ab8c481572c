//! Session-related types.
//!
//! Types stored in the session for authentication state.

use serde::{Deserialize, Serialize};

use moon_bling_core::{Email, UserId};

use crate::firebase::AuthUser;

/// Session-stored user identity.
///
/// Minimal data stored in the session to identify the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    /// Auth provider's user id.
    pub id: UserId,
    /// User's email address.
    pub email: Email,
}

impl From<AuthUser> for CurrentUser {
    fn from(user: AuthUser) -> Self {
        Self {
            id: user.id,
            email: user.email,
        }
    }
}

/// Session keys.
pub mod keys {
    /// Key for storing the current signed-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for pending alert messages.
    pub const FLASH: &str = "flash";
}
