//! Upload, detect and download page served with axum.

mod error;
mod page;
mod routes;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::body::Bytes;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use parking_lot::Mutex;

use crate::annotate::{AnnotateStyle, JPEG_QUALITY};
use crate::detectors::Detect;
use crate::pipeline::{annotate_frame, Annotated};

pub use error::{WebError, ENCODING_ERROR};
pub use page::{render_index, DOWNLOAD_NAME};
pub use routes::{decode_upload, DetectionsResponse, UPLOAD_FIELD};

pub const DEFAULT_BIND: &str = "0.0.0.0:8501";
pub const DEFAULT_MAX_UPLOAD: usize = 32 * 1024 * 1024;

/// Shared by every request. The detector sits behind a mutex, so one inference runs at a time.
#[derive(Clone)]
pub struct AppState {
    detector: Arc<Mutex<Box<dyn Detect>>>,
    style: Arc<AnnotateStyle>,
    pub jpeg_quality: u8,
}

impl AppState {
    pub fn new(detector: Box<dyn Detect>, style: AnnotateStyle) -> Self {
        Self {
            detector: Arc::new(Mutex::new(detector)),
            style: Arc::new(style),
            jpeg_quality: JPEG_QUALITY,
        }
    }

    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality;
        self
    }

    /// Decodes the upload and runs detection on the blocking pool.
    pub async fn annotate_upload(&self, upload: Bytes) -> Result<Annotated, WebError> {
        let detector = self.detector.clone();
        let style = self.style.clone();

        tokio::task::spawn_blocking(move || {
            let frame = decode_upload(&upload)?;
            let mut detector = detector.lock();
            annotate_frame(&mut **detector, frame, &style).map_err(WebError::Detection)
        })
        .await
        .map_err(|e| WebError::Internal(e.to_string()))?
    }
}

pub fn router(state: AppState, max_upload: usize) -> Router {
    Router::new()
        .route("/", get(routes::index))
        .route("/health", get(routes::health))
        .route("/api/detect", post(routes::detect))
        .route("/api/detections", post(routes::detections))
        .layer(DefaultBodyLimit::max(max_upload))
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, state: AppState, max_upload: usize) -> anyhow::Result<()> {
    let app = router(state, max_upload);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    log::info!("🚀 Listening on: http://{}", listener.local_addr()?);
    log::info!("🔧 Press Ctrl+C to stop the server");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for Ctrl+C: {e}");
        std::future::pending::<()>().await;
    }
}
