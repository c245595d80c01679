use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use tracing::{debug, info};

use crate::config::Config;


pub mod models;
pub mod queries;

pub use models::{Document, NewDocument};
pub use queries::DocumentQueries;

pub type DbPool = Pool<Sqlite>;

/// SQLite catalog of ingested documents
#[derive(Debug, Clone)]
pub struct Database {
    pool: DbPool,
}

impl Database {
    #[inline]
    pub async fn new<P: AsRef<Path>>(database_url: P) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(database_url)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .context("Failed to create database connection pool")?;

        let database = Self { pool };
        database.run_migrations().await?;

        Ok(database)
    }

    #[inline]
    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    #[inline]
    pub async fn run_migrations(&self) -> Result<()> {
        info!("Running database migrations");

        sqlx::migrate!("src/database/sqlite/migrations")
            .run(&self.pool)
            .await
            .context("Failed to run schema migration")?;

        debug!("Database migrations completed successfully");
        Ok(())
    }

    /// Open the catalog at the configured database path
    #[inline]
    pub async fn initialize(config: &Config) -> Result<Self> {
        let base_dir = config.get_base_dir();
        std::fs::create_dir_all(base_dir).with_context(|| {
            format!("Failed to create config directory: {}", base_dir.display())
        })?;

        Self::new(config.database_path()).await
    }

    #[inline]
    pub async fn record_document(&self, document: NewDocument) -> Result<Document> {
        DocumentQueries::upsert(&self.pool, document).await
    }

    /// Find a document by catalog name or index key
    #[inline]
    pub async fn find_document(&self, name_or_key: &str) -> Result<Option<Document>> {
        DocumentQueries::find(&self.pool, name_or_key).await
    }

    #[inline]
    pub async fn list_documents(&self) -> Result<Vec<Document>> {
        DocumentQueries::list_all(&self.pool).await
    }

    #[inline]
    pub async fn delete_document(&self, index_key: &str) -> Result<bool> {
        DocumentQueries::delete_by_index_key(&self.pool, index_key).await
    }

    #[inline]
    pub async fn count_documents(&self) -> Result<i64> {
        DocumentQueries::count(&self.pool).await
    }
}
