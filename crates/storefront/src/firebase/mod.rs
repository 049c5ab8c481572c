//! Firebase backend clients.
//!
//! Authentication and persistence are delegated to Firebase. Both concerns
//! sit behind a trait so handlers never see which implementation is in use:
//!
//! - [`AuthProvider`]: email/password sign-up and sign-in
//!   ([`IdentityToolkitClient`] against the Identity Toolkit REST API, or
//!   [`MemoryAuth`] for development and tests)
//! - [`RealtimeDatabase`]: a path-addressed JSON tree with continuous
//!   subscriptions ([`RestDatabase`] against the Realtime Database REST API,
//!   or [`MemoryDatabase`])

pub mod auth;
pub mod database;

pub use auth::{AuthError, AuthProvider, AuthUser, IdentityToolkitClient, MemoryAuth};
pub use database::{
    DatabaseError, DbPath, MemoryDatabase, RealtimeDatabase, RestDatabase, ValueStream,
    generate_push_key,
};
