//! SQLite driver implementation

use async_trait::async_trait;
use sqlrun_core::{ConnectionParams, Driver, Result, Session};

use crate::SqliteSession;

/// Driver opening file-backed or in-memory SQLite databases.
///
/// The `service_name` half of [`ConnectionParams`] carries the database
/// path; the network fields are not used.
pub struct SqliteDriver;

impl SqliteDriver {
    pub fn new() -> Self {
        tracing::debug!("SQLite driver initialized");
        Self
    }
}

impl Default for SqliteDriver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Driver for SqliteDriver {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    #[tracing::instrument(skip(self, params), fields(path = %params.service_name))]
    async fn connect(&self, params: &ConnectionParams) -> Result<Box<dyn Session>> {
        let session = SqliteSession::open(&params.service_name)?;
        tracing::info!(path = %params.service_name, "SQLite session established");
        Ok(Box::new(session))
    }

    #[tracing::instrument(skip(self, params), fields(path = %params.service_name))]
    async fn test_connection(&self, params: &ConnectionParams) -> Result<()> {
        let session = SqliteSession::open(&params.service_name)?;
        let outcome = session.probe();
        session.close().await?;
        outcome
    }
}
