use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use log::{error, info, warn};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use crate::config::{ServerConfig, SummaryConfig};
use crate::error::StoreError;
use crate::loader;
use crate::orchestrator::SummaryOrchestrator;
use crate::store::{UploadRecord, UploadStore};

const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

pub struct AppState {
    orchestrator: SummaryOrchestrator,
    store: UploadStore,
}

impl AppState {
    pub fn new(orchestrator: SummaryOrchestrator, store: UploadStore) -> Self {
        AppState {
            orchestrator,
            store,
        }
    }
}

#[derive(Serialize)]
struct UploadResponse<'a> {
    upload: &'a UploadRecord,
    cached: bool,
}

/// Routes for uploading files and browsing upload history
///
/// * `POST /api/users/:user/uploads` - multipart upload, field `file`
/// * `GET /api/users/:user/uploads` - the user's uploads, newest first
/// * `DELETE /api/users/:user/uploads/:id` - delete one of the user's uploads
/// * `GET /api/uploads` - every upload, newest first
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/api/users/:user/uploads",
            post(upload_file).get(upload_history),
        )
        .route("/api/users/:user/uploads/:id", delete(delete_upload))
        .route("/api/uploads", get(all_uploads))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Open the upload store and serve the API until the process is stopped
///
/// # Arguments
/// * `server` - Bind address and database directory
/// * `summary` - Summary pipeline settings
///
/// # Returns
/// * `Result<(), Box<dyn std::error::Error>>` - Only returns on startup or I/O failure
pub async fn run(server: ServerConfig, summary: SummaryConfig) -> Result<(), Box<dyn std::error::Error>> {
    let store = UploadStore::open(&server.database_dir)?;
    let state = Arc::new(AppState::new(SummaryOrchestrator::from_config(&summary), store));

    if !summary.script_path.exists() {
        warn!(
            "summary script {} not found, uploads will use the local summary",
            summary.script_path.display()
        );
    }

    let listener = TcpListener::bind(&server.bind_addr).await?;
    info!(
        "Listening on http://{} (summary commands: {}, script: {})",
        server.bind_addr,
        summary.commands.join(", "),
        summary.script_path.display()
    );
    axum::serve(listener, router(state)).await?;

    Ok(())
}

fn message(status: StatusCode, text: &str) -> Response {
    (status, Json(json!({ "message": text }))).into_response()
}

async fn upload_file(
    Path(user): Path<String>,
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Response {
    let mut file: Option<(String, Vec<u8>)> = None;

    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => {
                if field.name() != Some("file") {
                    continue;
                }
                let filename = field.file_name().unwrap_or("upload").to_string();
                match field.bytes().await {
                    Ok(bytes) => file = Some((filename, bytes.to_vec())),
                    Err(e) => {
                        warn!("failed to read upload from {}: {}", user, e);
                        return message(StatusCode::BAD_REQUEST, "Failed to read uploaded file");
                    }
                }
            }
            Ok(None) => break,
            Err(e) => {
                warn!("malformed multipart body from {}: {}", user, e);
                return message(StatusCode::BAD_REQUEST, "Malformed upload request");
            }
        }
    }

    let Some((filename, bytes)) = file else {
        return message(StatusCode::BAD_REQUEST, "No file uploaded");
    };

    let dataset = match loader::parse_upload(&filename, &bytes) {
        Ok(dataset) => dataset,
        Err(e) => {
            warn!("could not parse {} from {}: {}", filename, user, e);
            return message(StatusCode::BAD_REQUEST, &format!("Could not read file: {}", e));
        }
    };

    let result = match state.orchestrator.orchestrate(&dataset).await {
        Ok(result) => result,
        Err(e) => {
            error!("summary failed for {}: {}", filename, e);
            return message(StatusCode::INTERNAL_SERVER_ERROR, "Server error during file upload");
        }
    };

    let record = UploadRecord::new(&user, &filename, dataset, result.summary);
    let saving = {
        let state = Arc::clone(&state);
        let record = record.clone();
        tokio::task::spawn_blocking(move || state.store.save(record)).await
    };
    if let Err(e) = saving.map_err(|e| StoreError::Io(std::io::Error::other(e))).and_then(|r| r) {
        error!("error saving upload {}: {}", record.id, e);
        return message(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Error saving upload with summary",
        );
    }

    info!(
        "stored upload {} ({}, {} rows, cached summary: {})",
        record.id,
        record.filename,
        record.data.len(),
        result.from_cache
    );
    (
        StatusCode::CREATED,
        Json(UploadResponse {
            upload: &record,
            cached: result.from_cache,
        }),
    )
        .into_response()
}

async fn upload_history(
    Path(user): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Json<Vec<UploadRecord>> {
    Json(state.store.history(&user))
}

async fn all_uploads(State(state): State<Arc<AppState>>) -> Json<Vec<UploadRecord>> {
    Json(state.store.all())
}

async fn delete_upload(
    Path((user, id)): Path<(String, Uuid)>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let deleting = tokio::task::spawn_blocking(move || state.store.delete(id, &user))
        .await
        .map_err(|e| StoreError::Io(std::io::Error::other(e)))
        .and_then(|r| r);
    match deleting {
        Ok(()) => message(StatusCode::OK, "Upload deleted successfully"),
        Err(StoreError::NotFound) => {
            message(StatusCode::NOT_FOUND, "Upload not found or not authorized")
        }
        Err(e) => {
            error!("error deleting upload {}: {}", id, e);
            message(StatusCode::INTERNAL_SERVER_ERROR, "Server error deleting upload")
        }
    }
}
