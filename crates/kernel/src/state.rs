//! Application state shared across all handlers.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::config::Config;
use crate::db;
use crate::listing::ListingService;
use crate::services::TokenService;
use crate::store::{PgStore, Store};

/// Shared application state.
///
/// Wrapped in Arc internally so Clone is cheap.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Persistence for items, catalog, users and reports.
    store: Arc<dyn Store>,

    /// List query engine over the same store.
    listing: Arc<ListingService>,

    /// Session token verification.
    tokens: TokenService,
}

impl AppState {
    /// Connect to PostgreSQL, apply migrations and build the state.
    pub async fn new(config: &Config) -> Result<Self> {
        let pool = db::create_pool(config)
            .await
            .context("failed to create database pool")?;

        if config.run_migrations {
            db::run_migrations(&pool)
                .await
                .context("failed to run migrations")?;
            info!("database migrations applied");
        }

        let tokens = TokenService::new(config.jwt_secret.as_bytes());

        Ok(Self::with_store(
            Arc::new(PgStore::new(pool)),
            tokens,
            config.list_max_limit,
        ))
    }

    /// Build the state over any store implementation.
    pub fn with_store<S>(store: Arc<S>, tokens: TokenService, list_max_limit: u32) -> Self
    where
        S: Store + 'static,
    {
        let listing = ListingService::new(store.clone(), list_max_limit);

        Self {
            inner: Arc::new(AppStateInner {
                store,
                listing,
                tokens,
            }),
        }
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.inner.store
    }

    pub fn listing(&self) -> &Arc<ListingService> {
        &self.inner.listing
    }

    pub fn tokens(&self) -> &TokenService {
        &self.inner.tokens
    }
}
