//! # HTTP Server for Collage Editing and Export
//!
//! Wraps the compositing engine in a small JSON API: upload photos, confirm
//! crops, preview the design as HTML and download the finished collage.
//!
//! ## Usage
//!
//! ```bash
//! collagist serve --listen 0.0.0.0:8080 --font-dir ./fonts
//! ```
//!
//! ## Endpoints
//!
//! | Method | Path | Body | Response |
//! |--------|------|------|----------|
//! | POST | `/api/images` | multipart `image` | `{id, width, height}` |
//! | POST | `/api/images/:id/crop` | `{x, y, width, height}` or `{zoom, centerX, centerY}` | `{id, width, height}` |
//! | GET | `/api/images/:id/cropped` | | JPEG |
//! | POST | `/api/collage/preview` | `{images, design}` | HTML fragment |
//! | POST | `/api/collage/export` | `{images, design, format}` | PNG or PDF attachment |
//!
//! Uploads and crops live in memory and expire after an hour without use.

mod handlers;
mod state;

pub use handlers::ApiError;
pub use state::{AppState, SESSION_EXPIRATION_SECS, ServerConfig, UPLOAD_LIMIT_BYTES};

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::error::CollageResult;
use crate::render::text::FontBook;

/// Build the API router over shared state.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/api/images",
            post(handlers::images::upload).layer(DefaultBodyLimit::max(UPLOAD_LIMIT_BYTES)),
        )
        .route("/api/images/:id/crop", post(handlers::images::crop))
        .route("/api/images/:id/cropped", get(handlers::images::cropped))
        .route("/api/collage/preview", post(handlers::collage::preview))
        .route("/api/collage/export", post(handlers::collage::export))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// The loaded font book, or an empty one when the loader task died.
fn fonts_or_empty(result: Result<FontBook, tokio::task::JoinError>) -> FontBook {
    result.unwrap_or_else(|e| {
        warn!(error = %e, "font loading failed, starting without caption fonts");
        FontBook::default()
    })
}

/// Start the HTTP server.
///
/// ## Example
///
/// ```no_run
/// use collagist::server::{serve, ServerConfig};
///
/// # async fn example() -> collagist::CollageResult<()> {
/// let config = ServerConfig {
///     listen_addr: "0.0.0.0:8080".to_string(),
///     ..Default::default()
/// };
///
/// serve(config).await?;
/// # Ok(())
/// # }
/// ```
pub async fn serve(config: ServerConfig) -> CollageResult<()> {
    let dirs = config.font_dirs.clone();
    let fonts = fonts_or_empty(tokio::task::spawn_blocking(move || FontBook::from_dirs(&dirs)).await);
    info!(faces = fonts.len(), families = ?fonts.families(), "fonts loaded");

    let state = Arc::new(AppState::new(config.clone(), fonts));

    // Spawn background session cleanup task
    tokio::spawn(cleanup_sessions(state.clone()));

    let app = router(state);
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    info!(addr = %config.listen_addr, "collagist HTTP server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Background task to drop expired uploads and crops.
async fn cleanup_sessions(state: Arc<AppState>) {
    let mut interval = tokio::time::interval(Duration::from_secs(60));
    let expiration = Duration::from_secs(SESSION_EXPIRATION_SECS);

    loop {
        interval.tick().await;
        let (sources, crops) = state.sweep(Instant::now(), expiration).await;
        if sources + crops > 0 {
            info!(sources, crops, "cleaned up expired sessions");
        }
    }
}
