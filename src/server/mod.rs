//! HTTP API layer.
//!
//! Exposes the upload, predict, and transcribe endpoints and maps pipeline
//! errors to status codes. Services are constructed once and shared through
//! application state; heavy pipeline runs are admitted through a semaphore
//! and bounded by a wall-clock timeout.

use crate::config::Settings;
use crate::document::TextSplitter;
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::error::{Result, SvarError};
use crate::ingest::Ingestor;
use crate::rag::QaEngine;
use crate::transcription::{
    SpeechRecognizer, TranscriptChunk, TranscriptionPipeline, WhisperRecognizer,
};
use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

/// Shared application state.
pub struct AppState {
    settings: Settings,
    ingestor: Ingestor,
    qa: QaEngine,
    transcription: TranscriptionPipeline,
    pipeline_permits: Semaphore,
}

impl AppState {
    /// Construct all services from settings.
    pub fn new(settings: Settings) -> Result<Self> {
        let embedder: Arc<dyn Embedder> = Arc::new(OpenAIEmbedder::new(
            &settings.embedding.model,
            settings.embedding.dimensions as usize,
        ));

        let splitter = TextSplitter::new(settings.ingest.chunk_size, settings.ingest.chunk_overlap)?;
        let ingestor = Ingestor::new(embedder.clone(), splitter, settings.index_path());

        let qa = QaEngine::new(
            embedder,
            settings.index_path(),
            &settings.rag.model,
            settings.retrieval.top_k,
            settings.retrieval.min_score,
            settings.rag.temperature,
        );

        let recognizer: Arc<dyn SpeechRecognizer> =
            Arc::new(WhisperRecognizer::new(&settings.transcription.model));
        let transcription = TranscriptionPipeline::new(
            recognizer,
            settings.transcription.window_seconds,
            settings.temp_dir(),
        );

        Ok(Self {
            pipeline_permits: Semaphore::new(settings.general.max_concurrent_pipelines),
            settings,
            ingestor,
            qa,
            transcription,
        })
    }

    fn pipeline_timeout(&self) -> Duration {
        Duration::from_secs(self.settings.general.request_timeout_seconds)
    }
}

/// Build the API router.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // The default axum body limit (2 MB) is far too small for PDF uploads
    let upload_limit = DefaultBodyLimit::max(state.settings.server.max_upload_bytes);

    Router::new()
        .route("/health", get(health))
        .route("/upload/", post(upload).layer(upload_limit))
        .route("/predict", post(predict))
        .route("/transcribe_video", post(transcribe_video))
        .layer(cors)
        .with_state(state)
}

/// Run the HTTP API server.
pub async fn run(host: &str, port: u16, state: Arc<AppState>) -> Result<()> {
    let app = router(state);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

// === Request/Response Types ===

#[derive(Serialize)]
struct UploadResponse {
    filename: String,
}

#[derive(Deserialize)]
struct PredictRequest {
    input_query: String,
    semantic_search: bool,
}

#[derive(Serialize)]
struct PredictResponse {
    result: String,
}

#[derive(Deserialize)]
struct TranscribeRequest {
    #[serde(rename = "videoLink")]
    video_link: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// Handler-boundary error carrying a status code.
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl From<SvarError> for ApiError {
    fn from(err: SvarError) -> Self {
        let status = status_for(&err);
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error!("Request failed ({}): {}", self.status, self.message);
        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
            }),
        )
            .into_response()
    }
}

/// Map pipeline errors to HTTP status codes.
fn status_for(err: &SvarError) -> StatusCode {
    match err {
        SvarError::InvalidInput(_) | SvarError::Document(_) => StatusCode::BAD_REQUEST,
        SvarError::IndexNotFound(_) => StatusCode::NOT_FOUND,
        SvarError::Download(_)
        | SvarError::Embedding(_)
        | SvarError::Model(_)
        | SvarError::Http(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn timeout_error() -> ApiError {
    ApiError {
        status: StatusCode::GATEWAY_TIMEOUT,
        message: "Pipeline run exceeded the configured time limit".to_string(),
    }
}

fn busy_error() -> ApiError {
    ApiError {
        status: StatusCode::SERVICE_UNAVAILABLE,
        message: "Server is shutting down".to_string(),
    }
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Accept a single uploaded file, store it, and rebuild the index from the
/// whole upload directory. Uploaded files are never purged, including on
/// ingestion failure.
async fn upload(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> std::result::Result<Json<UploadResponse>, ApiError> {
    let mut stored: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| ApiError {
        status: StatusCode::BAD_REQUEST,
        message: format!("Malformed multipart body: {}", e),
    })? {
        let Some(original_name) = field.file_name().map(|s| s.to_string()) else {
            continue;
        };

        // Strip any path components a client may have sent
        let filename = Path::new(&original_name)
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.to_string())
            .ok_or_else(|| {
                SvarError::InvalidInput(format!("Unusable file name: {}", original_name))
            })?;

        let bytes = field.bytes().await.map_err(|e| ApiError {
            status: StatusCode::BAD_REQUEST,
            message: format!("Failed to read upload: {}", e),
        })?;

        let upload_dir = state.settings.upload_dir();
        std::fs::create_dir_all(&upload_dir).map_err(SvarError::from)?;
        std::fs::write(upload_dir.join(&filename), &bytes).map_err(SvarError::from)?;

        stored = Some(filename);
        break;
    }

    let filename = stored.ok_or_else(|| {
        SvarError::InvalidInput("Request contained no file field".to_string())
    })?;

    let _permit = state
        .pipeline_permits
        .acquire()
        .await
        .map_err(|_| busy_error())?;

    let report = tokio::time::timeout(
        state.pipeline_timeout(),
        state.ingestor.ingest(&state.settings.upload_dir()),
    )
    .await
    .map_err(|_| timeout_error())??;

    info!(
        "Ingested {} documents into {} chunks",
        report.documents, report.chunks_indexed
    );

    Ok(Json(UploadResponse { filename }))
}

/// Answer a query, either as a generated answer or raw semantic search.
async fn predict(
    State(state): State<Arc<AppState>>,
    Form(req): Form<PredictRequest>,
) -> std::result::Result<Json<PredictResponse>, ApiError> {
    let result = if req.semantic_search {
        let found = state.qa.semantic_search(&req.input_query).await?;
        format!("Semantic search: {}", found)
    } else {
        let answer = state.qa.answer(&req.input_query).await?;
        format!("Answer: {}", answer)
    };

    Ok(Json(PredictResponse { result }))
}

/// Transcribe the audio track of a video URL in fixed windows.
async fn transcribe_video(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TranscribeRequest>,
) -> std::result::Result<Json<Vec<TranscriptChunk>>, ApiError> {
    let _permit = state
        .pipeline_permits
        .acquire()
        .await
        .map_err(|_| busy_error())?;

    let chunks = tokio::time::timeout(
        state.pipeline_timeout(),
        state.transcription.transcribe_url(&req.video_link),
    )
    .await
    .map_err(|_| timeout_error())??;

    Ok(Json(chunks))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_for(&SvarError::InvalidInput("x".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&SvarError::Document("x".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&SvarError::IndexNotFound("x".into())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_for(&SvarError::Model("x".into())),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_for(&SvarError::Transcription("x".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_transcribe_request_wire_name() {
        let req: TranscribeRequest =
            serde_json::from_str(r#"{"videoLink": "https://example.com/v"}"#).unwrap();
        assert_eq!(req.video_link, "https://example.com/v");
    }

    #[test]
    fn test_default_upload_limit_allows_large_pdfs() {
        // axum's built-in body limit is 2 MB; uploads must not be capped there
        let settings = Settings::default();
        assert!(settings.server.max_upload_bytes > 2 * 1024 * 1024);
    }

    #[tokio::test]
    async fn test_router_wires_upload_body_limit() {
        let mut settings = Settings::default();
        settings.server.max_upload_bytes = 10 * 1024 * 1024;
        let state = Arc::new(AppState::new(settings).unwrap());
        // Router construction applies the configured limit to /upload/
        let _ = router(state);
    }

    #[test]
    fn test_predict_request_form_decoding() {
        let req: PredictRequest =
            serde_urlencoded::from_str("input_query=what+is+this&semantic_search=true").unwrap();
        assert_eq!(req.input_query, "what is this");
        assert!(req.semantic_search);
    }
}
