//! Document request store queries
//!
//! Requests always belong to a student. Admin listings join the student
//! row and apply the text search inside the join, so the filter sees
//! the same rows the page does.

use chrono::Utc;
use scolaris_common::db::{DocumentRequest, StudentSummary, UploadedDocument};
use scolaris_common::Result;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

const REQUEST_COLUMNS: &str = "dr.id, dr.student_id, dr.document_type, dr.custom_document_type, \
     dr.status, dr.request_date, dr.completion_date, dr.admin_notes, dr.rejection_reason, \
     dr.uploaded_filename, dr.uploaded_original_name, dr.uploaded_path, dr.uploaded_size, \
     dr.uploaded_at";

const STUDENT_SUMMARY_COLUMNS: &str = "s.id AS s_id, s.student_number AS s_student_number, \
     s.name AS s_name, s.given_name AS s_given_name, s.birth_date AS s_birth_date, \
     s.program AS s_program, s.email AS s_email";

/// Admin listing filter and paging options
#[derive(Debug, Clone, Default)]
pub struct RequestFilter {
    pub status: Option<String>,
    pub document_type: Option<String>,
    pub search: Option<String>,
    pub page: i64,
    pub limit: i64,
    pub sort_by: String,
    pub sort_order: String,
}

fn request_from_row(row: &SqliteRow, with_student: bool) -> DocumentRequest {
    let uploaded_document = row
        .get::<Option<String>, _>("uploaded_filename")
        .map(|filename| UploadedDocument {
            filename,
            original_name: row.get::<Option<String>, _>("uploaded_original_name").unwrap_or_default(),
            path: row.get::<Option<String>, _>("uploaded_path").unwrap_or_default(),
            size: row.get::<Option<i64>, _>("uploaded_size").unwrap_or(0),
            uploaded_at: row.get::<Option<String>, _>("uploaded_at").unwrap_or_default(),
        });

    let student = if with_student {
        Some(StudentSummary {
            id: row.get("s_id"),
            student_number: row.get("s_student_number"),
            name: row.get("s_name"),
            given_name: row.get("s_given_name"),
            birth_date: row.get("s_birth_date"),
            program: row.get("s_program"),
            email: row.get("s_email"),
        })
    } else {
        None
    };

    DocumentRequest {
        id: row.get("id"),
        student_id: row.get("student_id"),
        document_type: row.get("document_type"),
        custom_document_type: row.get("custom_document_type"),
        status: row.get("status"),
        request_date: row.get("request_date"),
        completion_date: row.get("completion_date"),
        admin_notes: row.get("admin_notes"),
        rejection_reason: row.get("rejection_reason"),
        uploaded_document,
        student,
    }
}

/// Create a request in `pending` state
pub async fn create(
    pool: &SqlitePool,
    student_id: &str,
    document_type: &str,
    custom_document_type: Option<&str>,
) -> Result<DocumentRequest> {
    let id = Uuid::new_v4().to_string();
    let now = Utc::now().to_rfc3339();

    sqlx::query(
        "INSERT INTO document_requests \
         (id, student_id, document_type, custom_document_type, status, request_date, \
          admin_notes, created_at, updated_at) \
         VALUES (?, ?, ?, ?, 'pending', ?, '', ?, ?)",
    )
    .bind(&id)
    .bind(student_id)
    .bind(document_type)
    .bind(custom_document_type)
    .bind(&now)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await?;

    Ok(DocumentRequest {
        id,
        student_id: student_id.to_string(),
        document_type: document_type.to_string(),
        custom_document_type: custom_document_type.map(str::to_string),
        status: "pending".to_string(),
        request_date: now,
        completion_date: None,
        admin_notes: String::new(),
        rejection_reason: None,
        uploaded_document: None,
        student: None,
    })
}

/// A student's own requests, newest first
pub async fn list_for_student(pool: &SqlitePool, student_id: &str) -> Result<Vec<DocumentRequest>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM document_requests dr WHERE dr.student_id = ? \
         ORDER BY dr.request_date DESC",
        REQUEST_COLUMNS
    ))
    .bind(student_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(|row| request_from_row(row, false)).collect())
}

/// Ownership-scoped single request lookup
pub async fn find_for_student(
    pool: &SqlitePool,
    id: &str,
    student_id: &str,
) -> Result<Option<DocumentRequest>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM document_requests dr WHERE dr.id = ? AND dr.student_id = ?",
        REQUEST_COLUMNS
    ))
    .bind(id)
    .bind(student_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|row| request_from_row(&row, false)))
}

/// Single request with the student summary populated
pub async fn find_by_id(pool: &SqlitePool, id: &str) -> Result<Option<DocumentRequest>> {
    let row = sqlx::query(&format!(
        "SELECT {}, {} FROM document_requests dr \
         JOIN students s ON s.id = dr.student_id WHERE dr.id = ?",
        REQUEST_COLUMNS, STUDENT_SUMMARY_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|row| request_from_row(&row, true)))
}

/// Admin listing: filters, join-level search, sort, pagination.
/// Returns the page plus the filtered total.
pub async fn admin_list(
    pool: &SqlitePool,
    filter: &RequestFilter,
) -> Result<(Vec<DocumentRequest>, i64)> {
    let mut conditions: Vec<&str> = Vec::new();
    let mut binds: Vec<String> = Vec::new();

    if let Some(status) = filter.status.as_deref().filter(|s| !s.is_empty()) {
        conditions.push("dr.status = ?");
        binds.push(status.to_string());
    }
    if let Some(document_type) = filter.document_type.as_deref().filter(|s| !s.is_empty()) {
        conditions.push("dr.document_type = ?");
        binds.push(document_type.to_string());
    }
    if let Some(search) = filter.search.as_deref().filter(|s| !s.is_empty()) {
        conditions.push(
            "(s.name LIKE ? OR s.given_name LIKE ? \
              OR CAST(s.student_number AS TEXT) LIKE ? OR s.program LIKE ?)",
        );
        let pattern = format!("%{}%", search);
        for _ in 0..4 {
            binds.push(pattern.clone());
        }
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    };

    // Sort column is whitelisted; anything unknown falls back to the
    // request date
    let sort_column = match filter.sort_by.as_str() {
        "status" => "dr.status",
        "documentType" => "dr.document_type",
        _ => "dr.request_date",
    };
    let sort_order = if filter.sort_order.eq_ignore_ascii_case("asc") {
        "ASC"
    } else {
        "DESC"
    };

    let limit = filter.limit.max(1);
    let page = filter.page.max(1);
    let offset = (page - 1) * limit;

    let list_sql = format!(
        "SELECT {}, {} FROM document_requests dr \
         JOIN students s ON s.id = dr.student_id{} \
         ORDER BY {} {} LIMIT ? OFFSET ?",
        REQUEST_COLUMNS, STUDENT_SUMMARY_COLUMNS, where_clause, sort_column, sort_order
    );
    let mut list_query = sqlx::query(&list_sql);
    for bind in &binds {
        list_query = list_query.bind(bind);
    }
    let rows = list_query.bind(limit).bind(offset).fetch_all(pool).await?;

    let count_sql = format!(
        "SELECT COUNT(*) FROM document_requests dr \
         JOIN students s ON s.id = dr.student_id{}",
        where_clause
    );
    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    for bind in &binds {
        count_query = count_query.bind(bind);
    }
    let total = count_query.fetch_one(pool).await?;

    Ok((
        rows.iter().map(|row| request_from_row(row, true)).collect(),
        total,
    ))
}

/// Set the status label directly; a `completed` status stamps the
/// completion date
pub async fn update_status(
    pool: &SqlitePool,
    id: &str,
    status: &str,
    admin_notes: Option<&str>,
    rejection_reason: Option<&str>,
) -> Result<Option<DocumentRequest>> {
    let now = Utc::now().to_rfc3339();
    let completion_date = (status == "completed").then(|| now.clone());

    let result = sqlx::query(
        "UPDATE document_requests SET status = ?, \
         admin_notes = COALESCE(?, admin_notes), \
         rejection_reason = COALESCE(?, rejection_reason), \
         completion_date = COALESCE(?, completion_date), \
         updated_at = ? \
         WHERE id = ?",
    )
    .bind(status)
    .bind(admin_notes)
    .bind(rejection_reason)
    .bind(&completion_date)
    .bind(&now)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    find_by_id(pool, id).await
}

/// Record an archived document and mark the request completed
pub async fn attach_document(
    pool: &SqlitePool,
    id: &str,
    document: &UploadedDocument,
) -> Result<Option<DocumentRequest>> {
    let now = Utc::now().to_rfc3339();

    let result = sqlx::query(
        "UPDATE document_requests SET \
         uploaded_filename = ?, uploaded_original_name = ?, uploaded_path = ?, \
         uploaded_size = ?, uploaded_at = ?, \
         status = 'completed', completion_date = ?, updated_at = ? \
         WHERE id = ?",
    )
    .bind(&document.filename)
    .bind(&document.original_name)
    .bind(&document.path)
    .bind(document.size)
    .bind(&document.uploaded_at)
    .bind(&now)
    .bind(&now)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    find_by_id(pool, id).await
}

/// Request counts grouped by status and by document type
pub async fn stats(pool: &SqlitePool) -> Result<(Vec<(String, i64)>, Vec<(String, i64)>)> {
    let by_status = sqlx::query_as::<_, (String, i64)>(
        "SELECT status, COUNT(*) FROM document_requests GROUP BY status ORDER BY status",
    )
    .fetch_all(pool)
    .await?;

    let by_type = sqlx::query_as::<_, (String, i64)>(
        "SELECT document_type, COUNT(*) FROM document_requests \
         GROUP BY document_type ORDER BY document_type",
    )
    .fetch_all(pool)
    .await?;

    Ok((by_status, by_type))
}
