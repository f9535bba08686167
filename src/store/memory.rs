use super::Database;
use crate::models::{Item, Transcription};
use anyhow::Result;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

/// Process-local store selected by a `memory://` connection string
///
/// Contents are lost when the process exits.
#[derive(Default)]
pub struct MemoryDatabase {
    items: RwLock<Vec<Item>>,
    transcriptions: RwLock<Vec<Transcription>>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Newest first; equal timestamps keep reverse insertion order
fn newest_first<T: Clone>(records: &[T], created_at: impl Fn(&T) -> DateTime<Utc>) -> Vec<T> {
    let mut sorted: Vec<T> = records.iter().rev().cloned().collect();
    sorted.sort_by(|a, b| created_at(b).cmp(&created_at(a)));
    sorted
}

#[async_trait::async_trait]
impl Database for MemoryDatabase {
    async fn insert_item(&self, item: &Item) -> Result<()> {
        self.items.write().await.push(item.clone());
        Ok(())
    }

    async fn list_items(&self) -> Result<Vec<Item>> {
        let items = self.items.read().await;
        Ok(newest_first(items.as_slice(), |item| item.created_at))
    }

    async fn insert_transcription(&self, transcription: &Transcription) -> Result<()> {
        self.transcriptions.write().await.push(transcription.clone());
        Ok(())
    }

    async fn list_transcriptions(&self) -> Result<Vec<Transcription>> {
        let transcriptions = self.transcriptions.read().await;
        Ok(newest_first(transcriptions.as_slice(), |t| t.created_at))
    }

    fn name(&self) -> &str {
        "memory"
    }
}
