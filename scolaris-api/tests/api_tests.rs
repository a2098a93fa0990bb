//! Integration tests for authentication and the student/admin routes

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use scolaris_api::db::{admins, students};
use scolaris_api::import::NormalizedStudent;
use scolaris_api::{build_router, AppState};
use scolaris_common::auth::{hash_password, issue_token, issue_token_with_expiry, Role};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::util::ServiceExt; // for `oneshot` method

const SECRET: &str = "test-secret";

/// Test helper: fresh database and router in a temp root folder
async fn setup() -> (TempDir, AppState, axum::Router) {
    let tmp = tempfile::tempdir().unwrap();
    let pool = scolaris_common::db::init_database(&tmp.path().join("scolaris.db"))
        .await
        .expect("Should initialize test database");
    let uploads = tmp.path().join("uploads");
    let documents = uploads.join("documents");
    let state = AppState::new(pool, SECRET.to_string(), uploads, documents);
    let app = build_router(state.clone());
    (tmp, state, app)
}

fn sample_student(number: i64, name: &str, birth_date: &str) -> NormalizedStudent {
    NormalizedStudent {
        student_number: number,
        name: name.to_string(),
        given_name: "Éléonore".to_string(),
        birth_date: birth_date.to_string(),
        program: "Informatique".to_string(),
        academic_year: "2024".to_string(),
        email: format!("{}@example.edu", number),
        group: "B".to_string(),
        level: "L3".to_string(),
        overall_average: 13.5,
        overall_result: "Admis".to_string(),
        subjects: Vec::new(),
    }
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    builder
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap()
}

/// Test helper: Extract JSON body from response
async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

// =============================================================================
// Health endpoint
// =============================================================================

#[tokio::test]
async fn test_health_endpoint_no_auth_required() {
    let (_tmp, _state, app) = setup().await;

    let response = app.oneshot(get("/health", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "scolaris-api");
    assert!(body["version"].is_string());
}

// =============================================================================
// Authentication boundary
// =============================================================================

#[tokio::test]
async fn test_missing_token_distinct_from_invalid() {
    let (_tmp, _state, app) = setup().await;

    let response = app.clone().oneshot(get("/api/admin/students", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["message"], "Token missing");

    let response = app
        .clone()
        .oneshot(get("/api/admin/students", Some("garbage")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["message"], "Token invalid");
}

#[tokio::test]
async fn test_expired_token_rejected() {
    let (_tmp, _state, app) = setup().await;

    let expired = issue_token_with_expiry(Role::Admin, "admin-test", 1_000_000, SECRET);
    let response = app
        .oneshot(get("/api/admin/students", Some(&expired)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["message"], "Token invalid");
}

#[tokio::test]
async fn test_wrong_role_is_forbidden() {
    let (_tmp, _state, app) = setup().await;

    let student = issue_token(Role::Student, "101", SECRET);
    let response = app
        .clone()
        .oneshot(get("/api/admin/students", Some(&student)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let admin = issue_token(Role::Admin, "admin-test", SECRET);
    let response = app
        .clone()
        .oneshot(get("/api/students/me", Some(&admin)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["message"], "Access denied");
}

// =============================================================================
// Student routes
// =============================================================================

#[tokio::test]
async fn test_student_login_and_me() {
    let (_tmp, state, app) = setup().await;
    students::insert(&state.db, &sample_student(22001234, "Durand", "2003-04-12"))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/students/login",
            None,
            &json!({"studentNumber": 22001234, "birthDate": "2003-04-12"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["student"]["studentNumber"], 22001234);
    let token = body["token"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(get("/api/students/me", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["name"], "Durand");
    assert_eq!(body["givenName"], "Éléonore");
}

#[tokio::test]
async fn test_student_login_requires_both_fields_to_match() {
    let (_tmp, state, app) = setup().await;
    students::insert(&state.db, &sample_student(22001234, "Durand", "2003-04-12"))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/students/login",
            None,
            &json!({"studentNumber": 22001234, "birthDate": "1999-01-01"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["message"], "Invalid student number or birth date");
}

#[tokio::test]
async fn test_student_tracks_listing() {
    let (_tmp, state, app) = setup().await;
    let mut student = sample_student(22001234, "Durand", "2003-04-12");
    student.academic_year = String::new();
    student.program = String::new();
    students::insert(&state.db, &student).await.unwrap();

    let token = issue_token(Role::Student, "22001234", SECRET);
    let response = app
        .oneshot(get("/api/students/tracks", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;

    // Blank year and program take the listing defaults
    assert_eq!(body[0]["academicYear"], "2024");
    assert_eq!(body[0]["program"], "Unknown");
}

#[tokio::test]
async fn test_student_record_ownership_enforced() {
    let (_tmp, state, app) = setup().await;
    students::insert(&state.db, &sample_student(22001234, "Durand", "2003-04-12"))
        .await
        .unwrap();
    students::insert(&state.db, &sample_student(22005678, "Martin", "2002-09-30"))
        .await
        .unwrap();

    let other = students::find_by_number(&state.db, 22005678)
        .await
        .unwrap()
        .unwrap();

    // A student cannot read another student's record by id
    let token = issue_token(Role::Student, "22001234", SECRET);
    let response = app
        .clone()
        .oneshot(get(
            &format!("/api/students/record/{}", other.id),
            Some(&token),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // The owner can
    let owner_token = issue_token(Role::Student, "22005678", SECRET);
    let response = app
        .clone()
        .oneshot(get(
            &format!("/api/students/record/{}", other.id),
            Some(&owner_token),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

// =============================================================================
// Admin routes
// =============================================================================

#[tokio::test]
async fn test_admin_login_and_me() {
    let (_tmp, state, app) = setup().await;
    admins::seed(&state.db, "Admin@Example.edu", &hash_password("s3cret-pw"))
        .await
        .unwrap();

    // Email is matched lowercased/trimmed
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/admin/login",
            None,
            &json!({"email": "  admin@example.edu ", "password": "s3cret-pw"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["admin"]["email"], "admin@example.edu");
    let token = body["token"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(get("/api/admin/me", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["email"], "admin@example.edu");
}

#[tokio::test]
async fn test_admin_login_failures_are_uniform() {
    let (_tmp, state, app) = setup().await;
    admins::seed(&state.db, "admin@example.edu", &hash_password("s3cret-pw"))
        .await
        .unwrap();

    for body in [
        json!({"email": "admin@example.edu", "password": "wrong"}),
        json!({"email": "nobody@example.edu", "password": "s3cret-pw"}),
    ] {
        let response = app
            .clone()
            .oneshot(json_request("POST", "/api/admin/login", None, &body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = extract_json(response.into_body()).await;
        assert_eq!(body["message"], "Invalid credentials");
    }
}

#[tokio::test]
async fn test_admin_student_listing_and_detail() {
    let (_tmp, state, app) = setup().await;
    students::insert(&state.db, &sample_student(22001234, "Durand", "2003-04-12"))
        .await
        .unwrap();
    students::insert(&state.db, &sample_student(22005678, "Martin", "2002-09-30"))
        .await
        .unwrap();

    let token = issue_token(Role::Admin, "admin-test", SECRET);
    let response = app
        .clone()
        .oneshot(get("/api/admin/students", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    let listed = body.as_array().unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0]["studentNumber"], 22001234);

    let id = listed[1]["id"].as_str().unwrap();
    let response = app
        .clone()
        .oneshot(get(&format!("/api/admin/students/{}", id), Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["name"], "Martin");

    let response = app
        .clone()
        .oneshot(get("/api/admin/students/unknown-id", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_identity_update_leaves_academic_payload() {
    let (_tmp, state, app) = setup().await;
    students::insert(&state.db, &sample_student(22001234, "Durand", "2003-04-12"))
        .await
        .unwrap();
    let student = students::find_by_number(&state.db, 22001234)
        .await
        .unwrap()
        .unwrap();

    let token = issue_token(Role::Admin, "admin-test", SECRET);
    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/api/admin/students/{}", student.id),
            Some(&token),
            &json!({"name": "Durand-Petit", "group": "C"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;

    assert_eq!(body["name"], "Durand-Petit");
    assert_eq!(body["group"], "C");
    // Omitted fields and the academic summary are untouched
    assert_eq!(body["email"], "22001234@example.edu");
    assert_eq!(body["overallAverage"], 13.5);
    assert_eq!(body["overallResult"], "Admis");
}
