//! Thin JSON-envelope HTTP façade over [`crate::Engine`] (feature `http`).
//!
//! Grounded on `engine.hpp`'s intent to "handle HTTP requests for document
//! processing" alongside the core pipeline, implemented here with `axum`
//! and `tower-http`'s tracing layer the way the other example repos in the
//! pack wire up their HTTP surfaces. This layer holds no chunking or
//! quality-assessment logic of its own — every handler just marshals JSON
//! and calls into the `Engine`.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Path as AxumPath, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

use crate::chunking::ChunkingResult;
use crate::document::{DocumentResult, EngineMetrics, ProcessingStats};
use crate::{Engine, Error};

/// A uniform response envelope for every endpoint (`{ success, message, data }`).
#[derive(Debug, Serialize)]
pub struct JsonEnvelope<T: Serialize> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    #[serde(skip)]
    status: StatusCode,
}

impl<T: Serialize> JsonEnvelope<T> {
    pub fn ok(data: T) -> Self {
        Self { success: true, data: Some(data), message: None, status: StatusCode::OK }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self::err_with_status(message, StatusCode::BAD_REQUEST)
    }

    pub fn err_with_status(message: impl Into<String>, status: StatusCode) -> Self {
        Self { success: false, data: None, message: Some(message.into()), status }
    }

    /// An `Error` carries its own input-vs-internal distinction; map it to
    /// the matching HTTP status rather than defaulting every failure to 400.
    pub fn from_error(error: Error) -> Self {
        let status = match error {
            Error::DecodeFailed(_) | Error::PoolShutdown | Error::ChunkerInvariantViolation(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::NotFound(_) | Error::TooLarge(..) | Error::UnsupportedType(_) | Error::EmptyAfterCleanup | Error::InvalidConfig(_) | Error::MetadataOverflow => {
                StatusCode::BAD_REQUEST
            }
        };
        Self::err_with_status(error.to_string(), status)
    }
}

impl<T: Serialize> IntoResponse for JsonEnvelope<T> {
    fn into_response(self) -> Response {
        let status = self.status;
        (status, Json(self)).into_response()
    }
}

/// Status of one tracked asynchronous batch job.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Completed { results: Vec<DocumentResult> },
    Failed { error: String },
}

/// In-memory job store. `std::sync::Mutex<HashMap<..>>`, not `DashMap`: the
/// façade is a thin convenience layer, not a high-throughput surface, so a
/// single coarse lock is the right tradeoff here.
#[derive(Default)]
pub struct JobStore {
    jobs: Mutex<std::collections::HashMap<String, JobStatus>>,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self) -> String {
        let id = uuid::Uuid::new_v4().simple().to_string();
        self.jobs.lock().unwrap().insert(id.clone(), JobStatus::Pending);
        id
    }

    pub fn complete(&self, id: &str, results: Vec<DocumentResult>) {
        self.jobs.lock().unwrap().insert(id.to_string(), JobStatus::Completed { results });
    }

    pub fn fail(&self, id: &str, error: String) {
        self.jobs.lock().unwrap().insert(id.to_string(), JobStatus::Failed { error });
    }

    pub fn get(&self, id: &str) -> Option<JobStatus> {
        self.jobs.lock().unwrap().get(id).cloned()
    }
}

/// Shared state handed to every route handler.
pub struct AppState {
    pub engine: Engine,
    pub jobs: JobStore,
}

/// Builds the router. Callers are responsible for binding and serving it
/// (e.g. with `axum::serve`), since the façade doesn't own the runtime.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/info", get(info))
        .route("/metrics", get(metrics))
        .route("/process", post(process_document))
        .route("/batch", post(process_batch))
        .route("/chunk", post(chunk_document))
        .route("/job/:id", get(get_job))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> JsonEnvelope<&'static str> {
    JsonEnvelope::ok("ok")
}

#[derive(Debug, Serialize)]
struct InfoResponse {
    supported_file_types: Vec<String>,
}

async fn info(State(state): State<Arc<AppState>>) -> JsonEnvelope<InfoResponse> {
    JsonEnvelope::ok(InfoResponse { supported_file_types: state.engine.supported_file_types() })
}

async fn metrics(State(state): State<Arc<AppState>>) -> JsonEnvelope<MetricsResponse> {
    JsonEnvelope::ok(MetricsResponse { stats: state.engine.get_statistics(), metrics: state.engine.get_metrics() })
}

#[derive(Debug, Serialize)]
struct MetricsResponse {
    stats: ProcessingStats,
    metrics: EngineMetrics,
}

#[derive(Debug, Deserialize)]
pub struct ProcessRequest {
    pub file_name: String,
    /// Base64-encoded document bytes.
    pub content_base64: String,
}

fn decode_base64(input: &str) -> Result<Vec<u8>, String> {
    use base64::Engine as _;
    base64::engine::general_purpose::STANDARD.decode(input).map_err(|e| e.to_string())
}

async fn process_document(State(state): State<Arc<AppState>>, Json(req): Json<ProcessRequest>) -> JsonEnvelope<DocumentResult> {
    let bytes = match decode_base64(&req.content_base64) {
        Ok(b) => b,
        Err(e) => return JsonEnvelope::err(format!("invalid base64: {e}")),
    };
    match state.engine.process_document_from_bytes(&req.file_name, &bytes) {
        Ok(result) => JsonEnvelope::ok(result),
        Err(e) => JsonEnvelope::from_error(e),
    }
}

#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    pub documents: Vec<ProcessRequest>,
}

#[derive(Debug, Serialize)]
struct BatchJobResponse {
    job_id: String,
}

/// Decodes every document up front (a bad base64 payload is a 400, reported
/// synchronously) then hands the actual processing to a background thread,
/// tracked under a job id pollable via `GET /job/{id}`.
async fn process_batch(State(state): State<Arc<AppState>>, Json(req): Json<BatchRequest>) -> JsonEnvelope<BatchJobResponse> {
    let mut decoded = Vec::with_capacity(req.documents.len());
    for doc in &req.documents {
        match decode_base64(&doc.content_base64) {
            Ok(bytes) => decoded.push((doc.file_name.clone(), bytes)),
            Err(e) => return JsonEnvelope::err(format!("invalid base64 for {}: {e}", doc.file_name)),
        }
    }

    let job_id = state.jobs.create();
    let state = Arc::clone(&state);
    let background_job_id = job_id.clone();
    std::thread::spawn(move || {
        let mut results = Vec::with_capacity(decoded.len());
        for (file_name, bytes) in decoded {
            match state.engine.process_document_from_bytes(&file_name, &bytes) {
                Ok(result) => results.push(result),
                Err(e) => {
                    state.jobs.fail(&background_job_id, e.to_string());
                    return;
                }
            }
        }
        state.jobs.complete(&background_job_id, results);
    });

    JsonEnvelope::ok(BatchJobResponse { job_id })
}

#[derive(Debug, Deserialize)]
pub struct ChunkRequest {
    pub document_id: String,
    pub content: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

async fn chunk_document(State(state): State<Arc<AppState>>, Json(req): Json<ChunkRequest>) -> JsonEnvelope<ChunkingResult> {
    let result = state.engine.chunk_text(&req.document_id, &req.content, &req.title, &req.metadata);
    JsonEnvelope::ok(result)
}

async fn get_job(State(state): State<Arc<AppState>>, AxumPath(id): AxumPath<String>) -> JsonEnvelope<JobStatus> {
    match state.jobs.get(&id) {
        Some(status) => JsonEnvelope::ok(status),
        None => JsonEnvelope::err_with_status("job not found", StatusCode::NOT_FOUND),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_store_tracks_lifecycle() {
        let store = JobStore::new();
        let id = store.create();
        assert!(matches!(store.get(&id), Some(JobStatus::Pending)));
        store.complete(&id, vec![DocumentResult::default()]);
        assert!(matches!(store.get(&id), Some(JobStatus::Completed { .. })));
    }

    #[test]
    fn unknown_job_id_returns_none() {
        let store = JobStore::new();
        assert!(store.get("nonexistent").is_none());
    }
}
