//! Application State Management
//!
//! Every shared component (cart storage, per-cart engines, the catalog and
//! the product response cache) is constructed here and passed to handlers
//! through axum state. Nothing lives in globals.

use crate::cart::{
    engine::CartEngine,
    storage::{cart_storage_key, CartStorage, FileStorage, MemoryStorage},
};
use crate::cache::ResponseCache;
use crate::catalog::{InMemoryCatalog, ProductCatalog, ProductPage};
use crate::config::Config;
use crate::error::ConfigError;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::info;

// =============================================================================
// Application State
// =============================================================================

/// Shared application state that can be safely passed between threads
pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub config: Config,

    /// Backing store of every cart record.
    pub cart_storage: Arc<dyn CartStorage>,

    /// One engine per cart id, created on first use.
    /// DashMap allows concurrent access without external Mutexes.
    pub carts: DashMap<String, Arc<CartEngine>>,

    pub catalog: Arc<dyn ProductCatalog>,

    /// Product listings keyed by their query parameters.
    pub product_cache: Arc<ResponseCache<ProductPage>>,
}

impl AppState {
    pub fn new(
        config: Config,
        cart_storage: Arc<dyn CartStorage>,
        catalog: Arc<dyn ProductCatalog>,
    ) -> Self {
        let product_cache = Arc::new(ResponseCache::new(
            config.cache_ttl,
            config.cache_max_entries,
        ));
        Self {
            config,
            cart_storage,
            carts: DashMap::new(),
            catalog,
            product_cache,
        }
    }

    /// Builds the state described by `config`: file-backed carts when a cart
    /// directory is configured and a catalog seeded from the configured file.
    pub fn from_config(config: Config) -> Result<Self, ConfigError> {
        let cart_storage: Arc<dyn CartStorage> = match &config.cart_dir {
            Some(dir) => {
                info!(dir = %dir.display(), "using file-backed cart storage");
                let storage = FileStorage::open(dir).map_err(|e| ConfigError::InvalidValue {
                    key: "STOREFRONT_CART_DIR".to_string(),
                    message: e.to_string(),
                })?;
                Arc::new(storage)
            }
            None => {
                info!("using in-memory cart storage");
                Arc::new(MemoryStorage::new())
            }
        };

        let catalog = match &config.catalog_path {
            Some(path) => InMemoryCatalog::from_json_file(path)?,
            None => {
                info!("no catalog seed configured, starting with an empty catalog");
                InMemoryCatalog::default()
            }
        };

        Ok(Self::new(config, cart_storage, Arc::new(catalog)))
    }

    /// In-memory state with default configuration.
    pub fn in_memory(catalog: InMemoryCatalog) -> Self {
        Self::new(
            Config::default(),
            Arc::new(MemoryStorage::new()),
            Arc::new(catalog),
        )
    }

    /// Returns the engine of `cart_id`, creating it on first use.
    pub fn cart(&self, cart_id: &str) -> Arc<CartEngine> {
        self.carts
            .entry(cart_id.to_string())
            .or_insert_with(|| {
                Arc::new(CartEngine::new(
                    self.cart_storage.clone(),
                    cart_storage_key(cart_id),
                ))
            })
            .clone()
    }

    /// Starts background maintenance. Must run inside a tokio runtime.
    pub fn start_background_tasks(&self) {
        self.product_cache.start_sweeper();
    }

    /// Stops background maintenance and drops cached responses.
    pub fn dispose(&self) {
        self.product_cache.dispose();
    }
}
