use super::Database;
use crate::models::{Item, Transcription};
use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use tracing::info;

/// Idempotent; `seq` breaks ties between equal timestamps
const SCHEMA: [&str; 4] = [
    "CREATE TABLE IF NOT EXISTS items (
        seq INTEGER PRIMARY KEY AUTOINCREMENT,
        id BLOB NOT NULL UNIQUE,
        name TEXT NOT NULL,
        price REAL NOT NULL,
        original_price REAL NOT NULL DEFAULT 0,
        discount_percent INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS items_created_at ON items (created_at)",
    "CREATE TABLE IF NOT EXISTS transcriptions (
        seq INTEGER PRIMARY KEY AUTOINCREMENT,
        id BLOB NOT NULL UNIQUE,
        filename TEXT,
        text TEXT NOT NULL,
        created_at TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS transcriptions_created_at ON transcriptions (created_at)",
];

/// SQLite-backed store (`sqlite://path/to/file.db?mode=rwc`)
pub struct SqliteDatabase {
    pool: SqlitePool,
}

impl SqliteDatabase {
    /// Open the database and create the tables if they are missing
    pub async fn connect(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .context("Invalid SQLite connection string")?
            .create_if_missing(true);

        // Every pooled connection to an in-memory database would see its own
        // empty database, so those get exactly one long-lived connection.
        let in_memory = url.contains(":memory:") || url.contains("mode=memory");
        if !in_memory {
            if let Some(parent) = database_path(url).parent() {
                if !parent.as_os_str().is_empty() {
                    tokio::fs::create_dir_all(parent)
                        .await
                        .with_context(|| format!("Failed to create database directory: {:?}", parent))?;
                }
            }
        }

        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .context("Failed to open SQLite database")?;

        let db = Self { pool };
        db.initialize_schema().await?;

        info!("SQLite database ready (in_memory={})", in_memory);

        Ok(db)
    }

    async fn initialize_schema(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .context("Failed to initialize schema")?;
        }
        Ok(())
    }

    /// Close the pool, waiting for checked-out connections
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// File path portion of `sqlite://path?params` / `sqlite:path`
fn database_path(url: &str) -> &Path {
    let rest = url
        .strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))
        .unwrap_or(url);
    Path::new(rest.split('?').next().unwrap_or(rest))
}

#[async_trait::async_trait]
impl Database for SqliteDatabase {
    async fn insert_item(&self, item: &Item) -> Result<()> {
        sqlx::query(
            "INSERT INTO items (id, name, price, original_price, discount_percent, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(item.id)
        .bind(&item.name)
        .bind(item.price)
        .bind(item.original_price)
        .bind(item.discount_percent)
        .bind(item.created_at)
        .execute(&self.pool)
        .await
        .context("Failed to insert item")?;

        Ok(())
    }

    async fn list_items(&self) -> Result<Vec<Item>> {
        let items = sqlx::query_as::<_, Item>(
            "SELECT id, name, price, original_price, discount_percent, created_at
             FROM items
             ORDER BY created_at DESC, seq DESC",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list items")?;

        Ok(items)
    }

    async fn insert_transcription(&self, transcription: &Transcription) -> Result<()> {
        sqlx::query(
            "INSERT INTO transcriptions (id, filename, text, created_at)
             VALUES (?, ?, ?, ?)",
        )
        .bind(transcription.id)
        .bind(&transcription.filename)
        .bind(&transcription.text)
        .bind(transcription.created_at)
        .execute(&self.pool)
        .await
        .context("Failed to insert transcription")?;

        Ok(())
    }

    async fn list_transcriptions(&self) -> Result<Vec<Transcription>> {
        let transcriptions = sqlx::query_as::<_, Transcription>(
            "SELECT id, filename, text, created_at
             FROM transcriptions
             ORDER BY created_at DESC, seq DESC",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list transcriptions")?;

        Ok(transcriptions)
    }

    fn name(&self) -> &str {
        "sqlite"
    }
}
