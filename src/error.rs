use thiserror::Error;

/// Missing or invalid required input on a record
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Errors surfaced by the HTTP handlers
///
/// Every variant is translated to a status code and a `{"error": ...}` body in
/// one place (see `http::error`).
#[derive(Debug, Error)]
pub enum Error {
    /// Missing or malformed request input (400)
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Uploaded file type is not on the allow-list (400)
    #[error("{0}")]
    UnsupportedMediaType(String),

    /// Database or disk failure (500)
    ///
    /// `message` is what the caller sees; `source` is only logged.
    #[error("{message}")]
    Storage {
        message: &'static str,
        #[source]
        source: anyhow::Error,
    },

    /// Unmapped route (404)
    #[error("Not found")]
    NotFound,

    /// Request exceeded the configured timeout (408)
    #[error("Request timed out")]
    Timeout,

    /// Anything unexpected, such as a panicking handler (500)
    ///
    /// The cause is only logged.
    #[error("Something went wrong. Please try again later.")]
    Internal(#[source] anyhow::Error),
}

impl Error {
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation(ValidationError::new(message))
    }

    pub fn storage(message: &'static str, source: impl Into<anyhow::Error>) -> Self {
        Error::Storage {
            message,
            source: source.into(),
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
