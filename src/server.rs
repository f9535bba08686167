use crate::config::Config;
use crate::http::{create_router, AppState};
use crate::store::{DatabaseCache, DatabaseConnector};
use crate::uploads::UploadStorage;
use anyhow::{bail, Context, Result};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};

/// Prepare upload storage and the database cache
///
/// With `database.eager_connect` the first connection is made here and any
/// failure aborts startup. Otherwise the connection is warmed up in the
/// background and a failure only shows up in requests.
pub async fn build_state(config: &Config) -> Result<AppState> {
    let uploads = UploadStorage::new(&config.uploads.dir);
    uploads.ensure_dir().await?;
    info!("Uploads stored in {:?}", uploads.dir());

    let database = Arc::new(DatabaseCache::new(
        DatabaseConnector::new(config.database.url.clone()),
        config.database.connect_timeout(),
    ));

    if config.database.eager_connect {
        if config.database.url.is_none() {
            bail!("DATABASE_URL must be set (database.eager_connect is enabled)");
        }
        let db = database
            .acquire()
            .await
            .context("Failed to connect to database")?;
        info!("Using {} database", db.name());
    } else {
        let cache = Arc::clone(&database);
        tokio::spawn(async move {
            if let Err(e) = cache.acquire().await {
                warn!("Database warm-up failed, retrying on next request: {}", e);
            }
        });
    }

    Ok(AppState::new(database, uploads))
}

/// Run the HTTP server until Ctrl+C or SIGTERM
pub async fn serve(config: Config) -> Result<()> {
    let state = build_state(&config).await?;
    let app = create_router(state, &config.service.http);

    let address = config.http_address();
    info!("Binding to {}", address);

    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    info!("{} running on {}", config.service.name, address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Server shut down");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                warn!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
