//! Reconciliation loop and report assembly
//!
//! One pass over the candidate rows in file order. Each well-formed row
//! either creates a record (unknown student number) or fully overwrites
//! the existing one. Row failures never abort the batch: rejections and
//! store errors are counted and sampled into the report, and processing
//! continues with the next row. Two rows sharing a student number
//! within one file resolve last-write-wins.

use crate::db::students;
use crate::import::normalize::NormalizedStudent;
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{info, warn};

/// Report lists are truncated to this many sample entries
pub const REPORT_SAMPLE_SIZE: usize = 10;

/// One data row headed into reconciliation: either a normalized payload
/// or the reason it was rejected
#[derive(Debug)]
pub struct CandidateRow {
    pub line_number: usize,
    pub normalized: Result<NormalizedStudent, String>,
}

/// Aggregate import report
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub message: String,
    /// Newly created records
    pub imported_count: i64,
    pub updated_count: i64,
    pub error_count: i64,
    /// Data rows parsed from the file (header excluded)
    pub total_processed: i64,
    pub results: Vec<String>,
    pub errors: Vec<String>,
    pub has_more_results: bool,
    pub has_more_errors: bool,
}

enum Reconciliation {
    Created,
    Updated,
}

/// Reconcile candidate rows against the student store, in order
pub async fn reconcile(pool: &SqlitePool, candidates: Vec<CandidateRow>) -> ImportReport {
    let total_processed = candidates.len() as i64;
    let mut imported_count = 0i64;
    let mut updated_count = 0i64;
    let mut error_count = 0i64;
    let mut results: Vec<String> = Vec::new();
    let mut errors: Vec<String> = Vec::new();

    for candidate in candidates {
        let record = match candidate.normalized {
            Ok(record) => record,
            Err(reason) => {
                error_count += 1;
                errors.push(format!("Line {}: {}", candidate.line_number, reason));
                continue;
            }
        };

        match apply(pool, &record).await {
            Ok(Reconciliation::Updated) => {
                updated_count += 1;
                results.push(format!("{} updated", record.student_number));
            }
            Ok(Reconciliation::Created) => {
                imported_count += 1;
                results.push(format!("{} created", record.student_number));
            }
            Err(e) => {
                warn!(
                    "Import row {} (student {}) failed: {}",
                    candidate.line_number, record.student_number, e
                );
                error_count += 1;
                errors.push(format!("Line {}: {}", candidate.line_number, e));
            }
        }
    }

    info!(
        "Import finished: {} created, {} updated, {} failed of {} rows",
        imported_count, updated_count, error_count, total_processed
    );

    let has_more_results = results.len() > REPORT_SAMPLE_SIZE;
    results.truncate(REPORT_SAMPLE_SIZE);
    let has_more_errors = errors.len() > REPORT_SAMPLE_SIZE;
    errors.truncate(REPORT_SAMPLE_SIZE);

    ImportReport {
        message: "Import complete".to_string(),
        imported_count,
        updated_count,
        error_count,
        total_processed,
        results,
        errors,
        has_more_results,
        has_more_errors,
    }
}

/// Create-or-overwrite by natural key. The read-check-then-write is not
/// atomic across concurrent imports; a lost race surfaces as a store
/// error on the losing row and is reported like any other row failure.
async fn apply(pool: &SqlitePool, record: &NormalizedStudent) -> scolaris_common::Result<Reconciliation> {
    match students::find_by_number(pool, record.student_number).await? {
        Some(existing) => {
            students::replace(pool, &existing.id, record).await?;
            Ok(Reconciliation::Updated)
        }
        None => {
            students::insert(pool, record).await?;
            Ok(Reconciliation::Created)
        }
    }
}
