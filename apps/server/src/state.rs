//! Shared application state

use crate::{
    config::{Config, StoreBackend},
    db::{EntityStore, InMemoryEntityStore, PostgresEntityStore},
    services::{EnrollmentService, PermissionResolver, StudyService},
    Result,
};
use sqlx::PgPool;
use std::sync::Arc;

/// Shared application state passed to all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn EntityStore>,
    pub study_service: Arc<StudyService>,
    pub enrollment_service: Arc<EnrollmentService>,
}

impl AppState {
    /// Initialize the application state with the configured store backend
    pub async fn new(config: Config) -> Result<Self> {
        tracing::info!(backend = ?config.store.backend, "Initializing application state...");

        let store: Arc<dyn EntityStore> = match config.store.backend {
            StoreBackend::Postgres => {
                let pool = create_db_pool(&config).await?;
                if config.database.run_migrations {
                    tracing::info!("Running database migrations...");
                    sqlx::migrate!("./migrations").run(&pool).await?;
                }
                Arc::new(PostgresEntityStore::new(pool))
            }
            StoreBackend::Memory => {
                tracing::warn!("Using the in-memory store; data is lost on restart");
                Arc::new(InMemoryEntityStore::new())
            }
        };

        let state = Self::with_store(config, store);
        tracing::info!("Application state initialized successfully");
        Ok(state)
    }

    /// Build the state around an existing store.
    pub fn with_store(config: Config, store: Arc<dyn EntityStore>) -> Self {
        let resolver = PermissionResolver::new(store.clone());
        let study_service = Arc::new(StudyService::new(store.clone(), resolver.clone()));
        let enrollment_service = Arc::new(EnrollmentService::new(store.clone(), resolver));

        Self {
            config: Arc::new(config),
            store,
            study_service,
            enrollment_service,
        }
    }
}

async fn create_db_pool(config: &Config) -> Result<PgPool> {
    tracing::info!("Creating database connection pool...");

    let statement_timeout = config.database.statement_timeout_seconds;
    let lock_timeout = config.database.lock_timeout_seconds;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .min_connections(config.database.pool_min_size)
        .max_connections(config.database.pool_max_size)
        .acquire_timeout(std::time::Duration::from_secs(
            config.database.pool_timeout_seconds,
        ))
        .after_connect(move |conn, _meta| {
            Box::pin(async move {
                sqlx::query(&format!("SET statement_timeout = '{}s'", statement_timeout))
                    .execute(&mut *conn)
                    .await?;

                // Fail fast instead of queueing behind a contended site row.
                sqlx::query(&format!("SET lock_timeout = '{}s'", lock_timeout))
                    .execute(&mut *conn)
                    .await?;

                Ok(())
            })
        })
        .connect(&config.database.url)
        .await?;

    tracing::info!(
        "Database pool created (min: {}, max: {})",
        config.database.pool_min_size,
        config.database.pool_max_size
    );

    Ok(pool)
}
