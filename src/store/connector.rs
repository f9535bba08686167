use super::{Connector, DatabaseHandle, MemoryDatabase, SqliteDatabase};
use anyhow::{anyhow, bail, Result};
use std::sync::Arc;

/// Connects using the configured connection string
///
/// A missing connection string fails each attempt rather than construction, so
/// an on-demand deployment can still start and report the problem per request.
pub struct DatabaseConnector {
    url: Option<String>,
}

impl DatabaseConnector {
    pub fn new(url: Option<String>) -> Self {
        Self { url }
    }
}

#[async_trait::async_trait]
impl Connector<DatabaseHandle> for DatabaseConnector {
    async fn connect(&self) -> Result<DatabaseHandle> {
        let url = self
            .url
            .as_deref()
            .ok_or_else(|| anyhow!("DATABASE_URL is not configured"))?;

        open_database(url).await
    }
}

/// Open the backend selected by the connection string's scheme
pub async fn open_database(url: &str) -> Result<DatabaseHandle> {
    let scheme = url.split(':').next().unwrap_or_default();

    match scheme {
        "sqlite" => Ok(Arc::new(SqliteDatabase::connect(url).await?)),
        "memory" => Ok(Arc::new(MemoryDatabase::new())),
        // Only the scheme is echoed; the rest may carry credentials
        _ => bail!("Unsupported database connection string scheme: {:?}", scheme),
    }
}
