use super::state::AppState;
use crate::error::{Error, Result};
use crate::models::{Item, NewItem, NewTranscription, Transcription};
use crate::uploads::{is_allowed_mime, StoredFile, UploadStorage};
use axum::{
    extract::{
        multipart::{Multipart, MultipartRejection},
        rejection::JsonRejection,
        State,
    },
    http::StatusCode,
    response::Json,
};
use serde::Serialize;
use tracing::{info, warn};

/// Multipart field carrying the audio file
const AUDIO_FIELD: &str = "audio";

/// Multipart field carrying caller-supplied transcript text
const TEXT_FIELD: &str = "text";

const INVALID_FILE_TYPE: &str = "Invalid file type. Only audio files are allowed.";
const UNEXPECTED_FILE_FIELD: &str = "Unexpected field";

const FETCH_ITEMS_FAILED: &str = "Server error while fetching items.";
const SAVE_ITEM_FAILED: &str = "Server error while saving item.";
const UPLOAD_FAILED: &str = "Server error while uploading file.";
const SAVE_TRANSCRIPTION_FAILED: &str = "Server error while saving transcription.";
const FETCH_TRANSCRIPTIONS_FAILED: &str = "Server error while fetching transcriptions.";

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,

    /// "connected" once the shared database handle has been opened
    pub database: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub success: bool,

    /// Whether the form carried an audio file
    pub file_attached: bool,

    pub transcription: Transcription,
}

// ============================================================================
// Liveness
// ============================================================================

/// GET /
pub async fn root() -> &'static str {
    "Backend running"
}

/// GET /health
/// Health check endpoint; never opens a connection
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let database = if state.database.cached().is_some() {
        "connected"
    } else {
        "disconnected"
    };

    Json(HealthResponse {
        status: "ok".to_string(),
        database: database.to_string(),
    })
}

// ============================================================================
// Items
// ============================================================================

/// GET /api/items
/// All items, newest first
pub async fn list_items(State(state): State<AppState>) -> Result<Json<Vec<Item>>> {
    let db = state.database(FETCH_ITEMS_FAILED).await?;

    let items = db
        .list_items()
        .await
        .map_err(|e| Error::storage(FETCH_ITEMS_FAILED, e))?;

    Ok(Json(items))
}

/// POST /api/items
/// Create an item; `discountPercent` is always derived here
pub async fn create_item(
    State(state): State<AppState>,
    payload: std::result::Result<Json<NewItem>, JsonRejection>,
) -> Result<(StatusCode, Json<Item>)> {
    let Json(input) = payload?;

    // Validate before touching the database
    let item = Item::new(input)?;

    let db = state.database(SAVE_ITEM_FAILED).await?;
    db.insert_item(&item)
        .await
        .map_err(|e| Error::storage(SAVE_ITEM_FAILED, e))?;

    info!(
        "Created item {} ({:?}, {}% off)",
        item.id, item.name, item.discount_percent
    );

    Ok((StatusCode::CREATED, Json(item)))
}

// ============================================================================
// Transcriptions
// ============================================================================

/// POST /api/upload
/// Store an uploaded audio file and record a transcription for it
pub async fn upload_audio(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>> {
    let mut multipart = multipart?;

    // An uncommitted file is removed when `form` is dropped, whether by an
    // error below or by the request being cancelled
    let mut form = read_upload_form(&state.uploads, &mut multipart).await?;
    let filename = form.file.as_ref().map(|file| file.filename.clone());
    let transcription = Transcription::from_upload(filename, form.text.take());

    save_upload_record(&state, &transcription).await?;

    let file_attached = match form.file.as_mut() {
        Some(file) => {
            file.commit();
            true
        }
        None => false,
    };

    info!(
        "Created transcription {} (file: {:?})",
        transcription.id, transcription.filename
    );

    Ok(Json(UploadResponse {
        success: true,
        file_attached,
        transcription,
    }))
}

/// POST /api/transcriptions
/// Save a text-only transcription
pub async fn create_transcription(
    State(state): State<AppState>,
    payload: std::result::Result<Json<NewTranscription>, JsonRejection>,
) -> Result<Json<Transcription>> {
    let Json(input) = payload?;
    let transcription = Transcription::from_text(input)?;

    let db = state.database(SAVE_TRANSCRIPTION_FAILED).await?;
    db.insert_transcription(&transcription)
        .await
        .map_err(|e| Error::storage(SAVE_TRANSCRIPTION_FAILED, e))?;

    info!("Created transcription {} (text only)", transcription.id);

    Ok(Json(transcription))
}

/// GET /api/transcriptions
/// All transcriptions, newest first
pub async fn list_transcriptions(State(state): State<AppState>) -> Result<Json<Vec<Transcription>>> {
    let db = state.database(FETCH_TRANSCRIPTIONS_FAILED).await?;

    let transcriptions = db
        .list_transcriptions()
        .await
        .map_err(|e| Error::storage(FETCH_TRANSCRIPTIONS_FAILED, e))?;

    Ok(Json(transcriptions))
}

/// Any unmapped route
pub async fn not_found() -> Error {
    Error::NotFound
}

// ============================================================================
// Upload form
// ============================================================================

async fn save_upload_record(state: &AppState, transcription: &Transcription) -> Result<()> {
    let db = state.database(UPLOAD_FAILED).await?;
    db.insert_transcription(transcription)
        .await
        .map_err(|e| Error::storage(UPLOAD_FAILED, e))
}

#[derive(Default)]
struct UploadForm {
    file: Option<StoredFile>,
    text: Option<String>,
}

/// Read the whole form, streaming the audio part to disk
///
/// On failure the partially read form is dropped, which removes any file
/// already written.
async fn read_upload_form(uploads: &UploadStorage, multipart: &mut Multipart) -> Result<UploadForm> {
    let mut form = UploadForm::default();

    while let Some(mut field) = multipart.next_field().await? {
        let name = field.name().map(str::to_owned);

        match name.as_deref() {
            Some(AUDIO_FIELD) => {
                if form.file.is_some() {
                    return Err(Error::validation("Only one audio file may be uploaded"));
                }

                // Checked before anything is written
                let content_type = field.content_type().unwrap_or_default().to_owned();
                if !is_allowed_mime(&content_type) {
                    warn!("Rejected upload with content type {:?}", content_type);
                    return Err(Error::UnsupportedMediaType(INVALID_FILE_TYPE.to_string()));
                }

                let original_name = field.file_name().map(str::to_owned);
                let mut writer = uploads
                    .create(original_name.as_deref())
                    .await
                    .map_err(|e| Error::storage(UPLOAD_FAILED, e))?;

                while let Some(chunk) = field.chunk().await? {
                    writer
                        .write_chunk(&chunk)
                        .await
                        .map_err(|e| Error::storage(UPLOAD_FAILED, e))?;
                }

                let file = writer
                    .finish()
                    .await
                    .map_err(|e| Error::storage(UPLOAD_FAILED, e))?;
                form.file = Some(file);
            }
            Some(TEXT_FIELD) => {
                form.text = Some(field.text().await?);
            }
            _ if field.file_name().is_some() => {
                warn!("Rejected file under unexpected field {:?}", name);
                return Err(Error::validation(UNEXPECTED_FILE_FIELD));
            }
            _ => {}
        }
    }

    Ok(form)
}
