use super::error::{handle_panic, timeout_as_json};
use super::handlers;
use super::state::AppState;
use crate::config::HttpConfig;
use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer, cors::CorsLayer, services::ServeDir, timeout::TimeoutLayer,
    trace::TraceLayer,
};

/// Create the HTTP router with all routes
pub fn create_router(state: AppState, http: &HttpConfig) -> Router {
    let upload_dir = state.uploads.dir().to_path_buf();

    Router::new()
        // Liveness
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
        // Items
        .route(
            "/api/items",
            get(handlers::list_items).post(handlers::create_item),
        )
        // Transcriptions
        .route(
            "/api/upload",
            post(handlers::upload_audio).layer(DefaultBodyLimit::max(http.max_upload_bytes)),
        )
        .route(
            "/api/transcriptions",
            get(handlers::list_transcriptions).post(handlers::create_transcription),
        )
        // Stored uploads
        .nest_service("/uploads", ServeDir::new(upload_dir))
        .fallback(handlers::not_found)
        .layer(
            ServiceBuilder::new()
                // A panicking handler answers 500 without affecting other requests
                .layer(CatchPanicLayer::custom(handle_panic))
                // Request logging
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                // Timeouts answer with the same `{"error": ...}` body as handlers
                .layer(middleware::map_response(timeout_as_json))
                .layer(TimeoutLayer::new(http.request_timeout())),
        )
        .with_state(state)
}
