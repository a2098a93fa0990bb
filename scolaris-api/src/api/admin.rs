//! Administrator API handlers
//!
//! Login plus the student management surface. Identity edits touch only
//! the six editable fields; academic results are written exclusively by
//! the notes import.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use scolaris_common::auth::{issue_token, verify_password, Claims, Role};
use scolaris_common::db::{AdminInfo, Student};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};

use crate::db::{admins, students};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct AdminLoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AdminLoginResponse {
    pub token: String,
    pub admin: AdminInfo,
}

/// POST /api/admin/login
///
/// Unknown email and wrong password answer identically.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<AdminLoginRequest>,
) -> Result<Json<AdminLoginResponse>, AdminError> {
    let email = req.email.trim().to_lowercase();

    let admin = admins::find_by_email(&state.db, &email)
        .await?
        .ok_or(AdminError::BadCredentials)?;

    if !verify_password(&req.password, &admin.password_hash) {
        return Err(AdminError::BadCredentials);
    }

    info!("Admin login: {}", admin.email);
    let token = issue_token(Role::Admin, &admin.id, &state.signing_secret);

    Ok(Json(AdminLoginResponse {
        token,
        admin: AdminInfo::from(&admin),
    }))
}

/// GET /api/admin/me
pub async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<AdminInfo>, AdminError> {
    let admin = admins::find_by_id(&state.db, &claims.subject)
        .await?
        .ok_or(AdminError::NotFound("Admin not found"))?;
    Ok(Json(AdminInfo::from(&admin)))
}

/// GET /api/admin/students
pub async fn list_students(
    State(state): State<AppState>,
) -> Result<Json<Vec<Student>>, AdminError> {
    let all = students::list_all(&state.db).await?;
    Ok(Json(all))
}

/// GET /api/admin/students/:id
pub async fn get_student(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Student>, AdminError> {
    let student = students::find_by_id(&state.db, &id)
        .await?
        .ok_or(AdminError::NotFound("Student not found"))?;
    Ok(Json(student))
}

/// Editable identity fields; omitted fields stay as they are
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStudentRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub program: Option<String>,
    pub academic_year: Option<String>,
    pub level: Option<String>,
    pub group: Option<String>,
}

/// PUT /api/admin/students/:id
pub async fn update_student(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateStudentRequest>,
) -> Result<Json<Student>, AdminError> {
    let update = students::IdentityUpdate {
        name: req.name,
        email: req.email,
        program: req.program,
        academic_year: req.academic_year,
        level: req.level,
        group: req.group,
    };

    let student = students::update_identity(&state.db, &id, &update)
        .await?
        .ok_or(AdminError::NotFound("Student not found"))?;
    Ok(Json(student))
}

/// Admin API errors
#[derive(Debug)]
pub enum AdminError {
    BadCredentials,
    NotFound(&'static str),
    Database(String),
}

impl From<scolaris_common::Error> for AdminError {
    fn from(e: scolaris_common::Error) -> Self {
        AdminError::Database(e.to_string())
    }
}

impl IntoResponse for AdminError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AdminError::BadCredentials => {
                (StatusCode::UNAUTHORIZED, "Invalid credentials".to_string())
            }
            AdminError::NotFound(what) => (StatusCode::NOT_FOUND, what.to_string()),
            AdminError::Database(msg) => {
                error!("Admin route database error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Server error".to_string())
            }
        };

        let body = Json(json!({
            "message": message,
        }));

        (status, body).into_response()
    }
}
