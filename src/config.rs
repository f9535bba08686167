use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

const DEFAULT_NAME: &str = "itemscribe";
const DEFAULT_BIND: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 5000;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_UPLOADS_DIR: &str = "uploads";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub database: DatabaseConfig,
    pub uploads: UploadsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,

    /// Requests running longer than this are aborted
    pub request_timeout_secs: u64,

    /// Body limit for `POST /api/upload`
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Connection string (`sqlite://...` or `memory://`)
    pub url: Option<String>,

    /// Upper bound for a single connection attempt
    pub connect_timeout_secs: u64,

    /// Connect before serving and refuse to start on failure. When false the
    /// server starts regardless and each request reports connection failures.
    pub eager_connect: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadsConfig {
    pub dir: String,
}

impl Config {
    /// Load configuration, lowest priority first:
    /// built-in defaults, the optional file at `path`, `ITEMSCRIBE__*`
    /// variables, then `DATABASE_URL` and `PORT`.
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .set_default("service.name", DEFAULT_NAME)?
            .set_default("service.http.bind", DEFAULT_BIND)?
            .set_default("service.http.port", i64::from(DEFAULT_PORT))?
            .set_default("service.http.request_timeout_secs", DEFAULT_REQUEST_TIMEOUT_SECS as i64)?
            .set_default("service.http.max_upload_bytes", DEFAULT_MAX_UPLOAD_BYTES as i64)?
            .set_default("database.connect_timeout_secs", DEFAULT_CONNECT_TIMEOUT_SECS as i64)?
            .set_default("database.eager_connect", true)?
            .set_default("uploads.dir", DEFAULT_UPLOADS_DIR)?
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("ITEMSCRIBE")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .set_override_option("database.url", non_empty_var("DATABASE_URL"))?
            .set_override_option("service.http.port", non_empty_var("PORT"))?
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    pub fn http_address(&self) -> String {
        format!("{}:{}", self.service.http.bind, self.service.http.port)
    }
}

impl HttpConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl DatabaseConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service: ServiceConfig {
                name: DEFAULT_NAME.to_string(),
                http: HttpConfig {
                    bind: DEFAULT_BIND.to_string(),
                    port: DEFAULT_PORT,
                    request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
                    max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
                },
            },
            database: DatabaseConfig {
                url: None,
                connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
                eager_connect: true,
            },
            uploads: UploadsConfig {
                dir: DEFAULT_UPLOADS_DIR.to_string(),
            },
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}
