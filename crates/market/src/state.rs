//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::config::MarketConfig;
use crate::scryfall::{ScryfallClient, ScryfallError};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the database pool and the catalog client.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: MarketConfig,
    pool: SqlitePool,
    scryfall: ScryfallClient,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Marketplace configuration
    /// * `pool` - SQLite connection pool
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog HTTP client cannot be built.
    pub fn new(config: MarketConfig, pool: SqlitePool) -> Result<Self, ScryfallError> {
        let scryfall = ScryfallClient::new(&config.scryfall)?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                scryfall,
            }),
        })
    }

    /// Get a reference to the marketplace configuration.
    #[must_use]
    pub fn config(&self) -> &MarketConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.inner.pool
    }

    /// Get a reference to the catalog client.
    #[must_use]
    pub fn scryfall(&self) -> &ScryfallClient {
        &self.inner.scryfall
    }
}
