//! One-shot alert messages carried across a redirect.
//!
//! A handler that redirects pushes a [`Flash`] into the session; the next
//! full page render takes and displays all pending messages.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use super::session::keys;

/// Alert severity, used as a CSS modifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Success,
    Error,
}

impl FlashLevel {
    /// CSS class suffix.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

/// A message shown once as `role="alert"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
}

impl Flash {
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Success,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Error,
            message: message.into(),
        }
    }

    /// Queue this message for the next page render.
    ///
    /// Session failures are logged; a lost alert never fails the request.
    pub async fn push(self, session: &Session) {
        let mut pending = session
            .get::<Vec<Self>>(keys::FLASH)
            .await
            .ok()
            .flatten()
            .unwrap_or_default();
        pending.push(self);

        if let Err(e) = session.insert(keys::FLASH, pending).await {
            tracing::warn!(error = %e, "Failed to store flash message");
        }
    }

    /// Remove and return all queued messages.
    pub async fn take_all(session: &Session) -> Vec<Self> {
        match session.remove::<Vec<Self>>(keys::FLASH).await {
            Ok(pending) => pending.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read flash messages");
                Vec::new()
            }
        }
    }
}
