//! HTTP front end: `GET /health` and `POST /predict`.

use std::sync::Arc;

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        DefaultBodyLimit, Multipart, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use log::{info, warn};
use serde_json::json;

use crate::config::ServerConfig;
use crate::error::{ClassificationError, UnsupportedMediaType};
use crate::models::{HealthResponse, MediaType, Prediction, RawImage};
use crate::pipeline::InferenceService;

/// Multipart field carrying the uploaded image.
pub const UPLOAD_FIELD: &str = "file";

/// Per-request failures, all rendered as `{"detail": ...}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    UnsupportedMediaType(#[from] UnsupportedMediaType),
    #[error("Error processing image: {0}")]
    Processing(#[from] ClassificationError),
    #[error("{}", .0.body_text())]
    Upload(#[from] MultipartError),
    #[error("{0}")]
    MissingFile(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::UnsupportedMediaType(_) | Self::Processing(_) => StatusCode::BAD_REQUEST,
            Self::Upload(e) => e.status(),
            Self::MissingFile(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

/// Builds the application router around a loaded service.
pub fn router(service: Arc<InferenceService>, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/predict", post(predict_digit))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(service)
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse::default())
}

async fn predict_digit(
    State(service): State<Arc<InferenceService>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Prediction>, ApiError> {
    let mut multipart = multipart.map_err(|e| ApiError::MissingFile(e.body_text()))?;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let declared = field.content_type().unwrap_or("None").to_string();
        let media_type = MediaType::from_mime(&declared).map_err(|e| {
            warn!("Rejected upload: {}", e);
            e
        })?;
        let bytes = field.bytes().await?;
        let image = RawImage::new(bytes.to_vec(), media_type);

        let prediction = tokio::task::spawn_blocking(move || service.classify(&image))
            .await
            .map_err(|e| ClassificationError::Task(e.to_string()))?
            .map_err(|e| {
                warn!("Failed to classify upload: {}", e);
                e
            })?;
        return Ok(Json(prediction));
    }

    Err(ApiError::MissingFile(format!(
        "Missing multipart field '{UPLOAD_FIELD}'"
    )))
}

/// Loads the model, serves until Ctrl-C/SIGTERM, then releases the model.
///
/// A model that fails to load stops startup before the listener is bound.
pub async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    let service = Arc::new(InferenceService::load(config.weights, config.runtime)?);
    let app = router(service, config.max_upload_bytes);

    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
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
    info!("Shutdown signal received");
}
