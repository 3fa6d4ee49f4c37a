use rand::seq::SliceRandom;
use sqlx::any::{install_default_drivers, AnyPoolOptions};
use sqlx::AnyPool;
use thiserror::Error;
use tracing::info;

use crate::config::DatabaseConfig;
use crate::database::schema;

/// URL that selects a private in-memory SQLite database
pub const IN_MEMORY_URL: &str = "sqlite::memory:";

/// Errors from Store
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// One writer handle and N interchangeable reader handles.
///
/// Pools are reference counted internally, so cloning a Store is cheap and
/// every clone talks to the same connections.
#[derive(Clone)]
pub struct Store {
    writer: AnyPool,
    readers: Vec<AnyPool>,
}

impl Store {
    /// Connect to the configured writer and replicas. With no replicas
    /// configured, reads go to the writer.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        if config.writer_url.is_empty() {
            return Err(DatabaseError::ConfigMissing("DATABASE_URL"));
        }
        if config.writer_url == IN_MEMORY_URL {
            return Self::in_memory().await;
        }

        install_default_drivers();

        let writer = Self::open(&config.writer_url, config.max_connections).await?;
        let mut readers = Vec::with_capacity(config.reader_urls.len());
        for url in &config.reader_urls {
            readers.push(Self::open(url, config.max_connections).await?);
        }
        if readers.is_empty() {
            readers.push(writer.clone());
        }

        info!(
            writer = %redact_url(&config.writer_url)?,
            readers = readers.len(),
            "Connected store"
        );
        Ok(Self { writer, readers })
    }

    /// Fresh in-memory SQLite store with the schema applied.
    ///
    /// SQLite gives every connection to `:memory:` its own database, so the
    /// pool is pinned to exactly one connection that is never recycled.
    pub async fn in_memory() -> Result<Self, DatabaseError> {
        install_default_drivers();

        let pool = AnyPoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect(IN_MEMORY_URL)
            .await?;

        let store = Self {
            writer: pool.clone(),
            readers: vec![pool],
        };
        store.create_schema().await?;
        Ok(store)
    }

    async fn open(url: &str, max_connections: u32) -> Result<AnyPool, DatabaseError> {
        Ok(AnyPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?)
    }

    /// Handle for writes and read-after-write checks
    pub fn writer(&self) -> &AnyPool {
        &self.writer
    }

    /// Any reader; results may trail the writer
    pub fn random_replica(&self) -> &AnyPool {
        self.readers
            .choose(&mut rand::thread_rng())
            .unwrap_or(&self.writer)
    }

    /// Apply the orgs/users DDL (idempotent)
    pub async fn create_schema(&self) -> Result<(), DatabaseError> {
        for statement in schema::APP_CREATE {
            sqlx::query(statement).execute(&self.writer).await?;
        }
        Ok(())
    }

    /// Pings the writer to ensure connectivity
    pub async fn health_check(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.writer).await?;
        Ok(())
    }

    /// Close writer and reader pools (e.g., on shutdown)
    pub async fn close(&self) {
        self.writer.close().await;
        for reader in &self.readers {
            reader.close().await;
        }
        info!("Closed store");
    }
}

/// Strip credentials from a connection URL so it can be logged
fn redact_url(raw: &str) -> Result<String, DatabaseError> {
    let mut url = url::Url::parse(raw).map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
    if url.password().is_some() {
        url.set_password(Some("****"))
            .map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
    }
    Ok(url.to_string())
}
