//! View state derived from remote state and the session.
//!
//! Data flows one way: session and database values are turned into plain
//! view structs here, and templates render those structs.

pub mod cart;
pub mod gate;
pub mod reveal;
pub mod sections;

pub use cart::{CartListView, CartRowView, CartView, TotalsView, cart_count_label};
pub use gate::{AuthLink, GateView, Page, evaluate};
pub use reveal::RevealConfig;
pub use sections::{CollectionView, Display, RouterView, SectionRouter, SectionView};
