use crate::error::ValidationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stored in place of a transcript when an upload carries no text
pub const PENDING_TRANSCRIPTION_TEXT: &str = "Transcription pending (no server STT connected).";

/// A transcript, optionally tied to an uploaded audio file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Transcription {
    /// Server-assigned identifier
    pub id: Uuid,

    /// Stored upload name (None for text-only submissions)
    pub filename: Option<String>,

    /// Transcribed text
    pub text: String,

    /// When the record was created
    pub created_at: DateTime<Utc>,
}

/// Request body for `POST /api/transcriptions`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewTranscription {
    pub text: Option<String>,
}

impl Transcription {
    pub fn new(filename: Option<String>, text: impl Into<String>) -> Result<Self, ValidationError> {
        let text = text.into();
        if text.is_empty() {
            return Err(ValidationError::new("No text provided"));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            filename,
            text,
            created_at: Utc::now(),
        })
    }

    /// Text-only submission, no file attached
    pub fn from_text(input: NewTranscription) -> Result<Self, ValidationError> {
        Self::new(None, input.text.unwrap_or_default())
    }

    /// Record for an upload; falls back to the pending placeholder when the
    /// form carried no text
    pub fn from_upload(filename: Option<String>, text: Option<String>) -> Self {
        let text = text
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| PENDING_TRANSCRIPTION_TEXT.to_string());

        Self {
            id: Uuid::new_v4(),
            filename,
            text,
            created_at: Utc::now(),
        }
    }
}
