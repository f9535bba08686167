pub mod config;
pub mod error;
pub mod http;
pub mod models;
pub mod server;
pub mod store;
pub mod uploads;

pub use config::Config;
pub use error::{Error, ValidationError};
pub use http::{create_router, AppState};
pub use models::{discount_percent, Item, NewItem, NewTranscription, Transcription};
pub use store::{
    ConnectError, ConnectionCache, Connector, Database, DatabaseCache, DatabaseConnector,
    DatabaseHandle, MemoryDatabase, SqliteDatabase,
};
pub use uploads::{StoredFile, UploadStorage};
