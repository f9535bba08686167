//! HTTP API for items and transcriptions
//!
//! - GET / - Liveness string
//! - GET /health - Health check
//! - GET /api/items - List items, newest first
//! - POST /api/items - Create an item
//! - POST /api/upload - Upload audio (multipart `audio`, optional `text`)
//! - POST /api/transcriptions - Save a text-only transcription
//! - GET /api/transcriptions - List transcriptions, newest first
//! - GET /uploads/:filename - Stored audio files

mod error;
mod handlers;
mod routes;
mod state;

pub use error::ErrorResponse;
pub use handlers::{HealthResponse, UploadResponse};
pub use routes::create_router;
pub use state::AppState;
