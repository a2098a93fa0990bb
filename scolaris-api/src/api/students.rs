//! Student-facing API handlers
//!
//! Students authenticate with their number and birth date and only ever
//! see their own records; every lookup is scoped by the number carried
//! in the verified token.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use scolaris_common::auth::{issue_token, Claims, Role};
use scolaris_common::db::{Student, TrackSummary};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;

use crate::db::students;
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentLoginRequest {
    pub student_number: i64,
    pub birth_date: String,
}

#[derive(Debug, Serialize)]
pub struct StudentLoginResponse {
    pub student: Student,
    pub token: String,
}

/// POST /api/students/login
///
/// Number and birth date must both match one record.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<StudentLoginRequest>,
) -> Result<Json<StudentLoginResponse>, StudentError> {
    let student =
        students::find_by_number_and_birth_date(&state.db, req.student_number, req.birth_date.trim())
            .await?
            .ok_or(StudentError::BadCredentials)?;

    let token = issue_token(
        Role::Student,
        &student.student_number.to_string(),
        &state.signing_secret,
    );

    Ok(Json(StudentLoginResponse { student, token }))
}

/// GET /api/students/me
pub async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Student>, StudentError> {
    let student = students::find_by_number(&state.db, subject_number(&claims)?)
        .await?
        .ok_or_else(|| StudentError::NotFound("Student not found"))?;
    Ok(Json(student))
}

/// GET /api/students/tracks
///
/// Program/year summaries for the caller's records.
pub async fn tracks(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<TrackSummary>>, StudentError> {
    let tracks = students::tracks_for_number(&state.db, subject_number(&claims)?).await?;
    Ok(Json(tracks))
}

/// GET /api/students/record/:id
///
/// Full record by id, restricted to the caller's own records.
pub async fn record(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Json<Student>, StudentError> {
    let student = students::find_by_id_and_number(&state.db, &id, subject_number(&claims)?)
        .await?
        .ok_or_else(|| StudentError::NotFound("Record not found"))?;
    Ok(Json(student))
}

fn subject_number(claims: &Claims) -> Result<i64, StudentError> {
    claims.subject.parse().map_err(|_| StudentError::InvalidToken)
}

/// Student API errors
#[derive(Debug)]
pub enum StudentError {
    BadCredentials,
    InvalidToken,
    NotFound(&'static str),
    Database(String),
}

impl From<scolaris_common::Error> for StudentError {
    fn from(e: scolaris_common::Error) -> Self {
        StudentError::Database(e.to_string())
    }
}

impl IntoResponse for StudentError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            StudentError::BadCredentials => (
                StatusCode::UNAUTHORIZED,
                "Invalid student number or birth date".to_string(),
            ),
            StudentError::InvalidToken => (StatusCode::UNAUTHORIZED, "Token invalid".to_string()),
            StudentError::NotFound(what) => (StatusCode::NOT_FOUND, what.to_string()),
            StudentError::Database(msg) => {
                error!("Student route database error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Server error".to_string())
            }
        };

        let body = Json(json!({
            "message": message,
        }));

        (status, body).into_response()
    }
}
