//! Document request API handlers
//!
//! Students create and read their own requests; admins list every
//! request, set the status label directly, and archive the produced
//! document. The archived PDF is NOT transient — it stays on disk and
//! is served back by the download route.

use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::Utc;
use scolaris_common::auth::Claims;
use scolaris_common::db::{
    is_valid_document_type, is_valid_request_status, DocumentRequest, Student, UploadedDocument,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

use crate::db::{requests, students};
use crate::AppState;

/// Multipart field carrying the archived document
const DOCUMENT_FIELD: &str = "document";

const NOTES_MAX_CHARS: usize = 500;

// ============================================================================
// Student routes
// ============================================================================

/// GET /api/document-requests/me
pub async fn list_my(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<DocumentRequest>>, RequestError> {
    let student = caller_record(&state, &claims).await?;
    let list = requests::list_for_student(&state.db, &student.id).await?;
    Ok(Json(list))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRequestBody {
    pub document_type: String,
    pub custom_document_type: Option<String>,
}

/// POST /api/document-requests/me
pub async fn create_my(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(body): Json<CreateRequestBody>,
) -> Result<(StatusCode, Json<DocumentRequest>), RequestError> {
    if !is_valid_document_type(&body.document_type) {
        return Err(RequestError::Validation("Invalid document type".to_string()));
    }

    // The free-form type requires its label; other types ignore it
    let custom = if body.document_type == "autre" {
        match body.custom_document_type.as_deref().filter(|s| !s.trim().is_empty()) {
            Some(label) => Some(label.trim().to_string()),
            None => {
                return Err(RequestError::Validation(
                    "Custom document type is required when document type is 'autre'".to_string(),
                ))
            }
        }
    } else {
        None
    };

    let student = caller_record(&state, &claims).await?;
    let request =
        requests::create(&state.db, &student.id, &body.document_type, custom.as_deref()).await?;
    info!(
        "Document request {} created for student {}",
        request.id, student.student_number
    );

    Ok((StatusCode::CREATED, Json(request)))
}

/// GET /api/document-requests/me/:id
pub async fn get_my(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Json<DocumentRequest>, RequestError> {
    let student = caller_record(&state, &claims).await?;
    let request = requests::find_for_student(&state.db, &id, &student.id)
        .await?
        .ok_or(RequestError::NotFound("Document request not found"))?;
    Ok(Json(request))
}

async fn caller_record(state: &AppState, claims: &Claims) -> Result<Student, RequestError> {
    let number: i64 = claims
        .subject
        .parse()
        .map_err(|_| RequestError::InvalidToken)?;
    students::find_by_number(&state.db, number)
        .await?
        .ok_or(RequestError::NotFound("Student not found"))
}

// ============================================================================
// Admin routes
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminListQuery {
    pub status: Option<String>,
    pub document_type: Option<String>,
    pub search: Option<String>,
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default = "default_sort_by")]
    pub sort_by: String,
    #[serde(default = "default_sort_order")]
    pub sort_order: String,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    10
}

fn default_sort_by() -> String {
    "requestDate".to_string()
}

fn default_sort_order() -> String {
    "desc".to_string()
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminListResponse {
    pub requests: Vec<DocumentRequest>,
    pub total_pages: i64,
    pub current_page: i64,
    pub total: i64,
}

/// GET /api/document-requests
pub async fn admin_list(
    State(state): State<AppState>,
    Query(query): Query<AdminListQuery>,
) -> Result<Json<AdminListResponse>, RequestError> {
    let filter = requests::RequestFilter {
        status: query.status,
        document_type: query.document_type,
        search: query.search,
        page: query.page,
        limit: query.limit,
        sort_by: query.sort_by,
        sort_order: query.sort_order,
    };

    let (list, total) = requests::admin_list(&state.db, &filter).await?;
    let limit = filter.limit.max(1);

    Ok(Json(AdminListResponse {
        requests: list,
        total_pages: (total + limit - 1) / limit,
        current_page: filter.page.max(1),
        total,
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCount {
    pub status: String,
    pub count: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeCount {
    pub document_type: String,
    pub count: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub status_stats: Vec<StatusCount>,
    pub document_type_stats: Vec<TypeCount>,
}

/// GET /api/document-requests/stats
pub async fn admin_stats(
    State(state): State<AppState>,
) -> Result<Json<StatsResponse>, RequestError> {
    let (by_status, by_type) = requests::stats(&state.db).await?;

    Ok(Json(StatsResponse {
        status_stats: by_status
            .into_iter()
            .map(|(status, count)| StatusCount { status, count })
            .collect(),
        document_type_stats: by_type
            .into_iter()
            .map(|(document_type, count)| TypeCount {
                document_type,
                count,
            })
            .collect(),
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRequestBody {
    pub status: String,
    pub admin_notes: Option<String>,
    pub rejection_reason: Option<String>,
}

/// PATCH /api/document-requests/:id
pub async fn admin_update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<UpdateRequestBody>,
) -> Result<Json<DocumentRequest>, RequestError> {
    if !is_valid_request_status(&body.status) {
        return Err(RequestError::Validation("Invalid status".to_string()));
    }
    if body.admin_notes.as_deref().is_some_and(|s| s.chars().count() > NOTES_MAX_CHARS) {
        return Err(RequestError::Validation(
            "Admin notes must be less than 500 characters".to_string(),
        ));
    }
    if body
        .rejection_reason
        .as_deref()
        .is_some_and(|s| s.chars().count() > NOTES_MAX_CHARS)
    {
        return Err(RequestError::Validation(
            "Rejection reason must be less than 500 characters".to_string(),
        ));
    }

    let request = requests::update_status(
        &state.db,
        &id,
        &body.status,
        body.admin_notes.as_deref(),
        body.rejection_reason.as_deref(),
    )
    .await?
    .ok_or(RequestError::NotFound("Document request not found"))?;

    Ok(Json(request))
}

/// POST /api/document-requests/:id/upload
///
/// Archive the produced PDF and mark the request completed.
pub async fn admin_upload(
    State(state): State<AppState>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Json<DocumentRequest>, RequestError> {
    // Reject unknown requests before anything lands on disk
    requests::find_by_id(&state.db, &id)
        .await?
        .ok_or(RequestError::NotFound("Document request not found"))?;

    let (original_name, data) = receive_pdf(multipart).await?;

    let filename = format!("document-{}.pdf", Uuid::new_v4());
    let path = state.documents_dir.join(&filename);
    tokio::fs::create_dir_all(&state.documents_dir)
        .await
        .map_err(|e| RequestError::Store(e.to_string()))?;
    tokio::fs::write(&path, &data)
        .await
        .map_err(|e| RequestError::Store(e.to_string()))?;

    let document = UploadedDocument {
        filename,
        original_name,
        path: path.to_string_lossy().to_string(),
        size: data.len() as i64,
        uploaded_at: Utc::now().to_rfc3339(),
    };

    let request = requests::attach_document(&state.db, &id, &document)
        .await?
        .ok_or(RequestError::NotFound("Document request not found"))?;
    info!("Archived document for request {}", id);

    Ok(Json(request))
}

async fn receive_pdf(mut multipart: Multipart) -> Result<(String, Vec<u8>), RequestError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| RequestError::Upload(e.to_string()))?
    {
        if field.name() != Some(DOCUMENT_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(str::to_string);
        let is_pdf = file_name.to_lowercase().ends_with(".pdf")
            && content_type.as_deref().map_or(true, |ct| ct == "application/pdf");
        if !is_pdf {
            return Err(RequestError::Validation(
                "Only PDF files are allowed".to_string(),
            ));
        }

        let data = field
            .bytes()
            .await
            .map_err(|e| RequestError::Upload(e.to_string()))?;
        return Ok((file_name, data.to_vec()));
    }

    Err(RequestError::Validation("No file uploaded".to_string()))
}

// ============================================================================
// Download (public; served by unguessable request id)
// ============================================================================

/// GET /api/document-requests/download/:id
pub async fn download(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, RequestError> {
    let request = requests::find_by_id(&state.db, &id)
        .await?
        .ok_or(RequestError::NotFound("Document not found"))?;
    let document = request
        .uploaded_document
        .ok_or(RequestError::NotFound("Document not found"))?;

    let bytes = tokio::fs::read(&document.path)
        .await
        .map_err(|_| RequestError::NotFound("File not found on server"))?;

    let headers = [
        (header::CONTENT_TYPE, "application/pdf".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", document.original_name),
        ),
    ];

    Ok((headers, bytes).into_response())
}

/// Document request API errors
#[derive(Debug)]
pub enum RequestError {
    InvalidToken,
    Validation(String),
    NotFound(&'static str),
    Upload(String),
    Store(String),
    Database(String),
}

impl From<scolaris_common::Error> for RequestError {
    fn from(e: scolaris_common::Error) -> Self {
        RequestError::Database(e.to_string())
    }
}

impl IntoResponse for RequestError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            RequestError::InvalidToken => (StatusCode::UNAUTHORIZED, "Token invalid".to_string()),
            RequestError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            RequestError::NotFound(what) => (StatusCode::NOT_FOUND, what.to_string()),
            RequestError::Upload(msg) => (StatusCode::BAD_REQUEST, format!("Upload failed: {}", msg)),
            RequestError::Store(msg) => {
                error!("Failed to archive document: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to store uploaded file".to_string(),
                )
            }
            RequestError::Database(msg) => {
                error!("Document request database error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Server error".to_string())
            }
        };

        let body = Json(json!({
            "message": message,
        }));

        (status, body).into_response()
    }
}
