//! Persistence for items and transcriptions
//!
//! - `Database` - insert-one / list-newest-first per collection
//! - `ConnectionCache` - one lazily opened handle shared by every request
//! - `SqliteDatabase` / `MemoryDatabase` - the two backends a connection
//!   string can select (`sqlite://...`, `memory://`)

mod cache;
mod connector;
mod memory;
mod sqlite;

pub use cache::{ConnectError, ConnectionCache, Connector};
pub use connector::{open_database, DatabaseConnector};
pub use memory::MemoryDatabase;
pub use sqlite::SqliteDatabase;

use crate::models::{Item, Transcription};
use anyhow::Result;
use std::sync::Arc;

/// Collection operations the HTTP layer needs
///
/// Both list operations return records ordered by `created_at` descending;
/// records sharing a timestamp come back in reverse insertion order.
#[async_trait::async_trait]
pub trait Database: Send + Sync {
    async fn insert_item(&self, item: &Item) -> Result<()>;

    async fn list_items(&self) -> Result<Vec<Item>>;

    async fn insert_transcription(&self, transcription: &Transcription) -> Result<()>;

    async fn list_transcriptions(&self) -> Result<Vec<Transcription>>;

    /// Backend name for logging
    fn name(&self) -> &str;
}

/// Shared handle to an open database
pub type DatabaseHandle = Arc<dyn Database>;

/// The process-wide database connection cache
pub type DatabaseCache = ConnectionCache<DatabaseHandle>;
