//! Realtime Database access.
//!
//! The database is one JSON tree addressed by `/`-separated paths. Writing
//! `null` deletes, empty objects are never stored, and a subscription yields
//! the value at its path immediately and again after every change.
//!
//! # Layout
//!
//! ```text
//! carts/{user_id}/{push_key} -> CartItem
//! orders/{push_key}          -> Order
//! ```

mod memory;
mod push_id;
mod rest;
mod sse;
pub mod tree;

use std::fmt;

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde_json::{Map, Value};
use thiserror::Error;

use moon_bling_core::{KeyError, PushKey, UserId, validate_key};

pub use memory::MemoryDatabase;
pub use push_id::generate_push_key;
pub use rest::RestDatabase;

/// A stream of successive values at a subscribed path.
pub type ValueStream = BoxStream<'static, Result<Value, DatabaseError>>;

/// Errors from the realtime database.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status other than an access failure.
    #[error("database returned {status}: {message}")]
    Status { status: u16, message: String },

    /// Security rules rejected the read or write.
    #[error("permission denied")]
    PermissionDenied,

    /// The server ended a subscription (`cancel` or `auth_revoked`).
    #[error("subscription cancelled by server: {0}")]
    Cancelled(String),

    /// Response or event payload was not the expected JSON.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// A path segment is not a valid key.
    #[error("invalid path: {0}")]
    InvalidPath(#[from] KeyError),

    /// The database cannot be reached.
    #[error("database unavailable")]
    Unavailable,
}

/// A validated location in the database tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct DbPath {
    segments: Vec<String>,
}

impl DbPath {
    /// The root of the tree.
    #[must_use]
    pub const fn root() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    /// Parse a `/`-separated path. Empty segments (leading, trailing or
    /// doubled slashes) are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError`] if any segment is not a valid key.
    pub fn parse(path: &str) -> Result<Self, KeyError> {
        let segments = path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| validate_key(s).map(|()| s.to_string()))
            .collect::<Result<_, _>>()?;
        Ok(Self { segments })
    }

    /// Append one segment.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError`] if `segment` is not a valid key.
    pub fn child(&self, segment: &str) -> Result<Self, KeyError> {
        validate_key(segment)?;
        Ok(self.child_unchecked(segment))
    }

    fn child_unchecked(&self, segment: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.to_string());
        Self { segments }
    }

    /// `carts/{user_id}`
    #[must_use]
    pub fn cart(user: &UserId) -> Self {
        Self::root()
            .child_unchecked("carts")
            .child_unchecked(user.as_str())
    }

    /// `carts/{user_id}/{key}`
    #[must_use]
    pub fn cart_item(user: &UserId, key: &PushKey) -> Self {
        Self::cart(user).child_unchecked(key.as_str())
    }

    /// `orders`
    #[must_use]
    pub fn orders() -> Self {
        Self::root().child_unchecked("orders")
    }

    /// `orders/{key}`
    #[must_use]
    pub fn order(key: &PushKey) -> Self {
        Self::orders().child_unchecked(key.as_str())
    }

    /// Path segments from the root.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Whether this is the root path.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }
}

impl fmt::Display for DbPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

/// Path-addressed JSON store with continuous subscriptions.
#[async_trait]
pub trait RealtimeDatabase: Send + Sync {
    /// Read the value at `path` (`Null` when absent).
    async fn get(&self, path: &DbPath) -> Result<Value, DatabaseError>;

    /// Append `value` under a newly generated, time-ordered child key.
    async fn push(&self, path: &DbPath, value: Value) -> Result<PushKey, DatabaseError>;

    /// Merge `fields` into the object at `path`. `null` fields are deleted.
    async fn update(&self, path: &DbPath, fields: Map<String, Value>) -> Result<(), DatabaseError>;

    /// Delete the value at `path`.
    async fn remove(&self, path: &DbPath) -> Result<(), DatabaseError>;

    /// Write several paths atomically: either every write lands or none.
    async fn update_many(&self, writes: Vec<(DbPath, Value)>) -> Result<(), DatabaseError>;

    /// Subscribe to the value at `path`.
    ///
    /// The stream yields the current value first and then the new value
    /// after each change. An `Err` item ends the stream.
    fn subscribe(&self, path: &DbPath) -> ValueStream;
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ignores_empty_segments() {
        let path = DbPath::parse("/carts//uid-1/").unwrap();
        assert_eq!(path.segments(), ["carts", "uid-1"]);
        assert_eq!(path.to_string(), "carts/uid-1");
        assert!(DbPath::parse("").unwrap().is_root());
    }

    #[test]
    fn test_parse_rejects_forbidden_characters() {
        assert_eq!(
            DbPath::parse("carts/a.b"),
            Err(KeyError::ForbiddenCharacter('.'))
        );
        assert!(DbPath::root().child("a#b").is_err());
    }

    #[test]
    fn test_well_known_paths() {
        let user = UserId::parse("uid-1").unwrap();
        let key = PushKey::parse("-NabcDEF").unwrap();
        assert_eq!(DbPath::cart(&user).to_string(), "carts/uid-1");
        assert_eq!(
            DbPath::cart_item(&user, &key).to_string(),
            "carts/uid-1/-NabcDEF"
        );
        assert_eq!(DbPath::order(&key).to_string(), "orders/-NabcDEF");
    }
}
