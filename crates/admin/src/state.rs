//! Application state shared across handlers.

use std::sync::Arc;

use axum::extract::FromRef;
use sqlx::PgPool;

use crate::config::AdminConfig;
use crate::db::{CollectionStore, PgCollectionStore};
use crate::middleware::AllowedShop;
use crate::shopify::{AdminClient, AdminShopifyError, CatalogSource};

/// Application state shared across all handlers.
///
/// Immutable after construction; cloning is an `Arc` bump.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    shopify: AdminClient,
    catalog: Arc<dyn CatalogSource>,
    collections: Arc<dyn CollectionStore>,
}

impl AppState {
    /// Build the production state: Shopify for the catalog, `PostgreSQL`
    /// for collections.
    ///
    /// # Errors
    ///
    /// Returns an error if the Shopify HTTP client cannot be built.
    pub fn new(config: AdminConfig, pool: PgPool) -> Result<Self, AdminShopifyError> {
        let shopify = AdminClient::new(&config.shopify)?;
        let catalog: Arc<dyn CatalogSource> = Arc::new(shopify.clone());
        let collections: Arc<dyn CollectionStore> = Arc::new(PgCollectionStore::new(pool));

        Ok(Self::with_backends(config, shopify, catalog, collections))
    }

    /// Build state from explicit backends.
    #[must_use]
    pub fn with_backends(
        config: AdminConfig,
        shopify: AdminClient,
        catalog: Arc<dyn CatalogSource>,
        collections: Arc<dyn CollectionStore>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                shopify,
                catalog,
                collections,
            }),
        }
    }

    /// Get the configuration.
    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    /// Get the Shopify client (OAuth).
    #[must_use]
    pub fn shopify(&self) -> &AdminClient {
        &self.inner.shopify
    }

    /// Get the product catalog.
    #[must_use]
    pub fn catalog(&self) -> &dyn CatalogSource {
        self.inner.catalog.as_ref()
    }

    /// Get the collection store.
    #[must_use]
    pub fn collections(&self) -> &dyn CollectionStore {
        self.inner.collections.as_ref()
    }
}

impl FromRef<AppState> for AllowedShop {
    fn from_ref(state: &AppState) -> Self {
        Self(state.config().shopify.store.clone())
    }
}
