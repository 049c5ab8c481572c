//! Moon Bling Core - Shared domain types.
//!
//! This crate provides the types shared by the storefront binary and its
//! integration tests:
//! - `storefront` - Public-facing e-commerce site
//! - `integration-tests` - End-to-end tests against in-memory backends
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no Firebase access. Everything here can be unit tested without a
//! runtime.
//!
//! # Modules
//!
//! - [`types`] - Keys, emails, prices, cart items, orders and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
