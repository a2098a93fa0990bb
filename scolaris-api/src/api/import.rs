//! Notes import route
//!
//! The uploaded file is a scoped resource: it is written under the
//! uploads directory, read back for processing, and removed again on
//! every exit path — batch-fatal failures included. Row-level outcomes
//! never surface here; they are aggregated into the report by the
//! reconciler.

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::path::Path;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::import::{self, ImportReport};
use crate::AppState;

/// Multipart field carrying the notes file
const CSV_FIELD: &str = "csvFile";

/// POST /api/admin/import-notes
pub async fn import_notes(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ImportReport>, ImportError> {
    let upload = receive_csv(multipart).await?;

    let artifact = state
        .uploads_dir
        .join(format!("notes-{}.csv", Uuid::new_v4()));
    tokio::fs::create_dir_all(&state.uploads_dir)
        .await
        .map_err(|e| ImportError::Store(e.to_string()))?;
    tokio::fs::write(&artifact, &upload)
        .await
        .map_err(|e| ImportError::Store(e.to_string()))?;
    info!(
        "Stored import artifact {} ({} bytes)",
        artifact.display(),
        upload.len()
    );

    let outcome = run_import(&state, &artifact).await;

    // Transient artifact: removed whether the batch succeeded or not
    if let Err(e) = tokio::fs::remove_file(&artifact).await {
        warn!(
            "Failed to remove import artifact {}: {}",
            artifact.display(),
            e
        );
    }

    outcome.map(Json)
}

/// Pull the CSV field out of the multipart body
async fn receive_csv(mut multipart: Multipart) -> Result<Vec<u8>, ImportError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ImportError::Upload(e.to_string()))?
    {
        if field.name() != Some(CSV_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        if !file_name.to_lowercase().ends_with(".csv") {
            return Err(ImportError::NotCsv);
        }

        let data = field
            .bytes()
            .await
            .map_err(|e| ImportError::Upload(e.to_string()))?;
        return Ok(data.to_vec());
    }

    Err(ImportError::NoFile)
}

async fn run_import(state: &AppState, artifact: &Path) -> Result<ImportReport, ImportError> {
    // Non-UTF-8 content makes the artifact unreadable: the whole batch
    // aborts before any row is touched
    let content = tokio::fs::read_to_string(artifact).await.map_err(|e| {
        error!("Unreadable import artifact {}: {}", artifact.display(), e);
        ImportError::Unreadable
    })?;

    let candidates = import::prepare(&content);
    Ok(import::reconcile(&state.db, candidates).await)
}

/// Batch-fatal import failures; row-level failures live in the report
#[derive(Debug)]
pub enum ImportError {
    /// Multipart body carried no CSV field
    NoFile,
    /// The uploaded file is not named *.csv
    NotCsv,
    /// Multipart transfer failed (size cap included)
    Upload(String),
    /// Could not persist the artifact
    Store(String),
    /// Artifact could not be read back
    Unreadable,
}

impl IntoResponse for ImportError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ImportError::NoFile => (StatusCode::BAD_REQUEST, "No CSV file provided".to_string()),
            ImportError::NotCsv => (
                StatusCode::BAD_REQUEST,
                "Only CSV files are accepted".to_string(),
            ),
            ImportError::Upload(msg) => {
                (StatusCode::BAD_REQUEST, format!("Upload failed: {}", msg))
            }
            ImportError::Store(msg) => {
                error!("Failed to store import artifact: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to store uploaded file".to_string(),
                )
            }
            ImportError::Unreadable => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to read uploaded file".to_string(),
            ),
        };

        let body = Json(json!({
            "message": message,
        }));

        (status, body).into_response()
    }
}
