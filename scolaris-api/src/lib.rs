//! scolaris-api library - student records backend
//!
//! REST surface for the Scolaris student-records service: student and
//! admin authentication, student management, document requests, and the
//! notes import reconciler.

use axum::extract::DefaultBodyLimit;
use axum::Router;
use sqlx::SqlitePool;
use std::path::PathBuf;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod db;
pub mod import;

/// Upload cap for notes files and archived documents
pub const UPLOAD_LIMIT_BYTES: usize = 10 * 1024 * 1024;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Token signing secret (explicit state, never read from globals)
    pub signing_secret: String,
    /// Transient import artifacts land here
    pub uploads_dir: PathBuf,
    /// Archived request documents land here
    pub documents_dir: PathBuf,
}

impl AppState {
    /// Create new application state
    pub fn new(
        db: SqlitePool,
        signing_secret: String,
        uploads_dir: PathBuf,
        documents_dir: PathBuf,
    ) -> Self {
        Self {
            db,
            signing_secret,
            uploads_dir,
            documents_dir,
        }
    }
}

/// Build application router
///
/// Three groups: student-token routes, admin-token routes, and public
/// routes (logins, document download, health). Authentication runs in
/// middleware before any handler or request body is touched.
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::{get, patch, post};

    let student_protected = Router::new()
        .route("/api/students/me", get(api::students::me))
        .route("/api/students/tracks", get(api::students::tracks))
        .route("/api/students/record/:id", get(api::students::record))
        .route(
            "/api/document-requests/me",
            get(api::requests::list_my).post(api::requests::create_my),
        )
        .route("/api/document-requests/me/:id", get(api::requests::get_my))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::student_auth,
        ));

    let admin_protected = Router::new()
        .route("/api/admin/me", get(api::admin::me))
        .route("/api/admin/students", get(api::admin::list_students))
        .route(
            "/api/admin/students/:id",
            get(api::admin::get_student).put(api::admin::update_student),
        )
        .route("/api/admin/import-notes", post(api::import::import_notes))
        .route("/api/document-requests", get(api::requests::admin_list))
        .route(
            "/api/document-requests/stats",
            get(api::requests::admin_stats),
        )
        .route(
            "/api/document-requests/:id",
            patch(api::requests::admin_update),
        )
        .route(
            "/api/document-requests/:id/upload",
            post(api::requests::admin_upload),
        )
        .layer(DefaultBodyLimit::max(UPLOAD_LIMIT_BYTES))
        .layer(middleware::from_fn_with_state(state.clone(), api::admin_auth));

    let public = Router::new()
        .route("/api/students/login", post(api::students::login))
        .route("/api/admin/login", post(api::admin::login))
        .route(
            "/api/document-requests/download/:id",
            get(api::requests::download),
        )
        .merge(api::health_routes());

    Router::new()
        .merge(student_protected)
        .merge(admin_protected)
        .merge(public)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
