//! Application state shared across handlers.

use std::sync::Arc;

use crate::catalog::{Catalog, CatalogError};
use crate::config::{Backend, StorefrontConfig};
use crate::firebase::{
    AuthProvider, DatabaseError, IdentityToolkitClient, MemoryAuth, MemoryDatabase,
    RealtimeDatabase, RestDatabase,
};
use crate::services::{CartService, CheckoutService};
use crate::views::RevealConfig;

/// Error building the application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
    #[error("database client error: {0}")]
    Database(#[from] DatabaseError),
    #[error("firebase backend selected but not configured")]
    MissingFirebaseConfig,
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// catalog, the auth provider and the services built on the realtime
/// database.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    catalog: Catalog,
    auth: Arc<dyn AuthProvider>,
    carts: CartService,
    checkout: CheckoutService,
    reveal: RevealConfig,
}

impl AppState {
    /// Create the application state for the configured backend.
    ///
    /// Loads the catalog from `config.catalog_path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be loaded or a Firebase client
    /// cannot be built.
    pub fn new(config: StorefrontConfig) -> Result<Self, StateError> {
        let catalog = Catalog::load(&config.catalog_path)?;

        let (auth, database): (Arc<dyn AuthProvider>, Arc<dyn RealtimeDatabase>) =
            match config.backend {
                Backend::Firebase => {
                    let firebase = config
                        .firebase
                        .as_ref()
                        .ok_or(StateError::MissingFirebaseConfig)?;
                    let client = reqwest::Client::builder()
                        .timeout(firebase.request_timeout)
                        .build()?;
                    (
                        Arc::new(IdentityToolkitClient::new(firebase, client.clone())),
                        Arc::new(RestDatabase::new(firebase, client)?),
                    )
                }
                Backend::Memory => {
                    tracing::warn!("Using in-memory backend; accounts and carts are lost on restart");
                    (Arc::new(MemoryAuth::new()), Arc::new(MemoryDatabase::new()))
                }
            };

        Ok(Self::with_backends(config, catalog, auth, database))
    }

    /// Create the application state from explicit backends.
    #[must_use]
    pub fn with_backends(
        config: StorefrontConfig,
        catalog: Catalog,
        auth: Arc<dyn AuthProvider>,
        database: Arc<dyn RealtimeDatabase>,
    ) -> Self {
        let carts = CartService::new(Arc::clone(&database));
        let checkout = CheckoutService::new(database, carts.clone());

        Self {
            inner: Arc::new(AppStateInner {
                config,
                catalog,
                auth,
                carts,
                checkout,
                reveal: RevealConfig::default(),
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the product catalog.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.inner.catalog
    }

    /// Get the authentication provider.
    #[must_use]
    pub fn auth(&self) -> &dyn AuthProvider {
        self.inner.auth.as_ref()
    }

    /// Get the cart manager.
    #[must_use]
    pub fn carts(&self) -> &CartService {
        &self.inner.carts
    }

    /// Get the checkout service.
    #[must_use]
    pub fn checkout(&self) -> &CheckoutService {
        &self.inner.checkout
    }

    /// Get the reveal animation settings rendered into every page.
    #[must_use]
    pub fn reveal(&self) -> RevealConfig {
        self.inner.reveal
    }
}
