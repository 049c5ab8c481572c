//! Session-backed models for the storefront.

pub mod flash;
pub mod session;

pub use flash::{Flash, FlashLevel};
pub use session::{CurrentUser, keys as session_keys};
