//! Shared state handed to every request handler.

use anyhow::Context;
use std::sync::Arc;

use crate::auth::SessionTokens;
use crate::config::{AppConfig, StoreBackend};
use crate::database::{
    DatabaseManager, MemoryTripStore, MemoryUserStore, PgTripStore, PgUserStore, TripStore,
    UserStore,
};
use crate::services::{AccountService, TripService};
use crate::storage::{MemoryObjectStore, ObjectStore, SupabaseStorage};

/// Cheap to clone: services hold `Arc`ed stores and the pool is reference counted.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub tokens: SessionTokens,
    pub trips: TripService,
    pub accounts: AccountService,
    /// `None` when running on the in-memory stores
    pub database: Option<DatabaseManager>,
}

impl AppState {
    /// Connect the configured backends. Postgres migrations are applied here.
    pub async fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let trips: Arc<dyn TripStore>;
        let users: Arc<dyn UserStore>;
        let database = match config.database.backend {
            StoreBackend::Postgres => {
                let manager = DatabaseManager::connect(&config.database)
                    .await
                    .context("connecting to Postgres")?;
                manager.migrate().await.context("applying migrations")?;
                trips = Arc::new(PgTripStore::new(manager.pool().clone()));
                users = Arc::new(PgUserStore::new(manager.pool().clone()));
                Some(manager)
            }
            StoreBackend::Memory => {
                tracing::warn!("Using in-memory stores; data is lost on restart");
                trips = Arc::new(MemoryTripStore::new());
                users = Arc::new(MemoryUserStore::new());
                None
            }
        };

        let objects: Arc<dyn ObjectStore> = match config.storage.supabase_url {
            Some(_) => Arc::new(
                SupabaseStorage::from_config(&config.storage).context("configuring Supabase storage")?,
            ),
            None => {
                tracing::warn!("SUPABASE_URL not set; uploads are kept in memory until restart");
                Arc::new(MemoryObjectStore::default())
            }
        };

        Self::assemble(config, trips, users, objects, database)
    }

    /// Everything in process. Used by tests.
    pub fn in_memory(config: &AppConfig) -> anyhow::Result<Self> {
        Self::assemble(
            config,
            Arc::new(MemoryTripStore::new()),
            Arc::new(MemoryUserStore::new()),
            Arc::new(MemoryObjectStore::default()),
            None,
        )
    }

    fn assemble(
        config: &AppConfig,
        trips: Arc<dyn TripStore>,
        users: Arc<dyn UserStore>,
        objects: Arc<dyn ObjectStore>,
        database: Option<DatabaseManager>,
    ) -> anyhow::Result<Self> {
        let tokens = SessionTokens::from_config(&config.security)?;
        tracing::info!("Session tokens in {:?} mode", tokens.mode());

        Ok(Self {
            config: Arc::new(config.clone()),
            trips: TripService::new(trips, users.clone(), objects, &config.api),
            accounts: AccountService::new(users, tokens.clone(), config.security.demo_login_enabled),
            tokens,
            database,
        })
    }
}
