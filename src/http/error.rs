use crate::error::Error;
use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::JsonRejection,
    },
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use std::any::Any;
use tracing::{error, warn};

/// Body of every failed response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            Error::Validation(_) | Error::UnsupportedMediaType(_) => StatusCode::BAD_REQUEST,
            Error::Storage { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::NotFound => StatusCode::NOT_FOUND,
            Error::Timeout => StatusCode::REQUEST_TIMEOUT,
            Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        match &self {
            Error::Storage { message, source } => error!("{}: {:#}", message, source),
            Error::Internal(source) => error!("Unhandled error while serving request: {:#}", source),
            Error::NotFound => {}
            rejected => warn!("Rejected request: {}", rejected),
        }

        (status, Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Error::validation(rejection.body_text())
    }
}

impl From<MultipartRejection> for Error {
    fn from(rejection: MultipartRejection) -> Self {
        Error::validation(rejection.body_text())
    }
}

impl From<MultipartError> for Error {
    fn from(e: MultipartError) -> Self {
        Error::validation(e.body_text())
    }
}

/// Response for a handler that panicked; the panic stays in the server log
pub fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };

    Error::Internal(anyhow::anyhow!("handler panicked: {}", detail)).into_response()
}

/// Give the bare 408 produced by the timeout layer the usual JSON body
pub async fn timeout_as_json(response: Response) -> Response {
    let bare = response.status() == StatusCode::REQUEST_TIMEOUT
        && !response.headers().contains_key(header::CONTENT_TYPE);

    if bare {
        Error::Timeout.into_response()
    } else {
        response
    }
}
