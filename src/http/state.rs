use crate::error::{Error, Result};
use crate::store::{DatabaseCache, DatabaseHandle};
use crate::uploads::UploadStorage;
use std::sync::Arc;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Lazily opened database handle, shared by every request
    pub database: Arc<DatabaseCache>,

    /// Where uploaded audio is written
    pub uploads: Arc<UploadStorage>,
}

impl AppState {
    pub fn new(database: Arc<DatabaseCache>, uploads: UploadStorage) -> Self {
        Self {
            database,
            uploads: Arc::new(uploads),
        }
    }

    /// The shared database handle; a failed connection is reported as a
    /// storage error carrying `message`
    pub async fn database(&self, message: &'static str) -> Result<DatabaseHandle> {
        self.database
            .acquire()
            .await
            .map_err(|e| Error::storage(message, e))
    }
}
