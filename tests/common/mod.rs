// Shared helpers for the HTTP integration tests
#![allow(dead_code)]

use axum::{
    body::{Body, Bytes},
    http::{header, Method, Request, StatusCode},
    Router,
};
use itemscribe::config::HttpConfig;
use itemscribe::{create_router, AppState, Config, DatabaseCache, DatabaseConnector, UploadStorage};
use futures::StreamExt;
use serde_json::Value;
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;

pub const BOUNDARY: &str = "itemscribe-test-boundary";

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    /// Keeps the upload directory alive for the duration of the test
    pub temp_dir: TempDir,
}

impl TestApp {
    pub fn upload_dir(&self) -> PathBuf {
        self.state.uploads.dir().to_path_buf()
    }

    /// Names of the files currently in the upload directory
    pub fn stored_files(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.upload_dir())
            .expect("upload dir should exist")
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), 10_000_000)
            .await
            .unwrap();
        (status, body.to_vec())
    }

    pub async fn send_json(&self, request: Request<Body>) -> (StatusCode, Value) {
        let (status, body) = self.send(request).await;
        let parsed = serde_json::from_slice(&body)
            .unwrap_or_else(|e| panic!("response is not JSON ({}): {:?}", e, String::from_utf8_lossy(&body)));
        (status, parsed)
    }
}

/// App backed by an in-memory database
pub async fn test_app() -> TestApp {
    test_app_with_database(Some("memory://".to_string())).await
}

/// App whose connection string is `url` (None = not configured)
pub async fn test_app_with_database(url: Option<String>) -> TestApp {
    test_app_with(url, Config::default().service.http).await
}

/// In-memory app with custom HTTP settings
pub async fn test_app_with_http(http: HttpConfig) -> TestApp {
    test_app_with(Some("memory://".to_string()), http).await
}

async fn test_app_with(url: Option<String>, http: HttpConfig) -> TestApp {
    let temp_dir = TempDir::new().unwrap();
    let uploads = UploadStorage::new(temp_dir.path().join("uploads"));
    uploads.ensure_dir().await.unwrap();

    let database = Arc::new(DatabaseCache::new(
        DatabaseConnector::new(url),
        Duration::from_secs(5),
    ));
    let state = AppState::new(database, uploads);
    let router = create_router(state.clone(), &http);

    TestApp {
        router,
        state,
        temp_dir,
    }
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// One part of a multipart form
pub enum Part<'a> {
    File {
        name: &'a str,
        filename: &'a str,
        content_type: &'a str,
        data: &'a [u8],
    },
    Text {
        name: &'a str,
        value: &'a str,
    },
}

pub fn post_multipart(uri: &str, parts: &[Part<'_>]) -> Request<Body> {
    let mut body = Vec::new();

    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::File {
                name,
                filename,
                content_type,
                data,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                        name, filename, content_type
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(data);
            }
            Part::Text { name, value } => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n{}", name, value)
                        .as_bytes(),
                );
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

/// Multipart upload that sends the start of an `audio` part and then stalls
/// forever, like a client that stopped sending mid-upload
pub fn post_stalled_upload(uri: &str, data: &[u8]) -> Request<Body> {
    let mut head = format!(
        "--{}\r\nContent-Disposition: form-data; name=\"audio\"; filename=\"slow.wav\"\r\nContent-Type: audio/wav\r\n\r\n",
        BOUNDARY
    )
    .into_bytes();
    head.extend_from_slice(data);

    let body = futures::stream::once(async move { Ok::<_, std::io::Error>(Bytes::from(head)) })
        .chain(futures::stream::pending());

    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from_stream(body))
        .unwrap()
}

/// A short 16kHz mono WAV file
pub fn wav_bytes() -> Vec<u8> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 16000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for i in 0..1600 {
            let sample = ((i as f32 * 0.1).sin() * 8000.0) as i16;
            writer.write_sample(sample).unwrap();
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}
