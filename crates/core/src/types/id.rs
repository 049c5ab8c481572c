//! Newtype keys for type-safe references into the realtime database.
//!
//! Every key ends up as a path segment (`carts/{user_id}/{push_key}`), so the
//! `define_key!` macro validates that the value cannot escape its segment.

/// Errors produced when a string is not a valid database key.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyError {
    /// The key is empty.
    #[error("key cannot be empty")]
    Empty,
    /// The key exceeds the maximum segment length.
    #[error("key must be at most {max} bytes")]
    TooLong {
        /// Maximum allowed length in bytes.
        max: usize,
    },
    /// The key contains a character the database forbids in paths.
    #[error("key contains forbidden character {0:?}")]
    ForbiddenCharacter(char),
}

/// Characters the realtime database rejects inside a path segment.
const FORBIDDEN: &[char] = &['.', '#', '$', '[', ']', '/'];

/// Maximum key length accepted by the realtime database.
pub const MAX_KEY_LENGTH: usize = 768;

/// Validate a single database path segment.
///
/// # Errors
///
/// Returns a [`KeyError`] if the segment is empty, too long, or contains a
/// forbidden or control character.
pub fn validate_key(key: &str) -> Result<(), KeyError> {
    if key.is_empty() {
        return Err(KeyError::Empty);
    }
    if key.len() > MAX_KEY_LENGTH {
        return Err(KeyError::TooLong {
            max: MAX_KEY_LENGTH,
        });
    }
    if let Some(c) = key
        .chars()
        .find(|c| FORBIDDEN.contains(c) || c.is_control())
    {
        return Err(KeyError::ForbiddenCharacter(c));
    }
    Ok(())
}

/// Macro to define a type-safe key wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - `parse()` validating the value as a database path segment
/// - `Display`, `AsRef<str>` and `FromStr`
///
/// # Example
///
/// ```rust
/// # use moon_bling_core::define_key;
/// define_key!(ProductKey);
///
/// let key = ProductKey::parse("ring-01").unwrap();
/// assert_eq!(key.as_str(), "ring-01");
/// assert!(ProductKey::parse("../orders").is_err());
/// ```
#[macro_export]
macro_rules! define_key {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Parse and validate a key.
            ///
            /// # Errors
            ///
            /// Returns an error if the value is not a valid path segment.
            pub fn parse(value: &str) -> Result<Self, $crate::KeyError> {
                $crate::validate_key(value)?;
                Ok(Self(value.to_owned()))
            }

            /// Get the key as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = $crate::KeyError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }
    };
}

// Authentication provider's opaque user identifier (Firebase `localId`).
define_key!(UserId);
// Database-generated child key (Firebase push id).
define_key!(PushKey);
