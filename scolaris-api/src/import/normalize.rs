//! Row normalization
//!
//! Maps one raw data row to a store-ready student payload, or rejects
//! it. Only the student number can reject a row: it is the
//! reconciliation key and must parse as an integer. Every other field
//! degrades silently — strings default to empty, numerics to zero.

use super::columns::{ColumnMap, STUDENT_NUMBER_HEADER};
use super::parser::RawRow;
use scolaris_common::db::SubjectResult;

/// A fully normalized candidate record, ready for reconciliation
#[derive(Debug, Clone)]
pub struct NormalizedStudent {
    pub student_number: i64,
    pub name: String,
    pub given_name: String,
    pub birth_date: String,
    pub program: String,
    pub academic_year: String,
    pub email: String,
    pub group: String,
    pub level: String,
    pub overall_average: f64,
    pub overall_result: String,
    /// Always one entry per subject slot, unpopulated slots included
    pub subjects: Vec<SubjectResult>,
}

/// Why a row was rejected before reaching the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowRejection {
    pub line_number: usize,
    pub reason: String,
}

/// Normalize one raw row against the resolved column map
///
/// `headers` is only used for diagnostics: a row without a student
/// number reports which columns the file actually carried.
pub fn normalize_row(
    map: &ColumnMap,
    headers: &[String],
    row: &RawRow,
) -> Result<NormalizedStudent, RowRejection> {
    let raw_number = row.cell(map.student_number);
    if raw_number.is_empty() {
        return Err(RowRejection {
            line_number: row.line_number,
            reason: format!(
                "missing {} (columns present: {})",
                STUDENT_NUMBER_HEADER,
                headers.join(", ")
            ),
        });
    }

    let student_number: i64 = match raw_number.parse() {
        Ok(n) => n,
        Err(_) => {
            return Err(RowRejection {
                line_number: row.line_number,
                reason: format!("invalid {} '{}'", STUDENT_NUMBER_HEADER, raw_number),
            })
        }
    };

    let subjects = map
        .subjects
        .iter()
        .enumerate()
        .map(|(i, sc)| SubjectResult {
            slot: (i + 1) as i64,
            subject_type: row.cell(sc.subject_type).to_string(),
            code: row.cell(sc.code).to_string(),
            label: row.cell(sc.label).to_string(),
            grade: parse_numeric(row.cell(sc.grade)),
            outcome: row.cell(sc.outcome).to_string(),
            session: row.cell(sc.session).to_string(),
            jury_points: parse_numeric(row.cell(sc.jury_points)),
        })
        .collect();

    Ok(NormalizedStudent {
        student_number,
        name: row.cell(map.name).to_string(),
        given_name: row.cell(map.given_name).to_string(),
        birth_date: row.cell(map.birth_date).to_string(),
        program: row.cell(map.program).to_string(),
        academic_year: row.cell(map.academic_year).to_string(),
        email: row.cell(map.email).to_string(),
        group: row.cell(map.group).to_string(),
        level: row.cell(map.level).to_string(),
        overall_average: parse_numeric(row.cell(map.overall_average)),
        overall_result: row.cell(map.overall_result).to_string(),
        subjects,
    })
}

/// Grades and jury points coerce to 0 when absent or unparsable. There
/// is no "unknown" sentinel distinct from a true zero.
fn parse_numeric(value: &str) -> f64 {
    value.parse().unwrap_or(0.0)
}
