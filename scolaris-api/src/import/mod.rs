//! Notes import: parse, normalize, reconcile
//!
//! The pipeline consumes the raw text of an uploaded notes file and
//! reconciles every row against the student store by natural key
//! (student number): unknown numbers create records, known numbers are
//! fully overwritten. The caller receives an aggregate report with
//! created/updated/failed counts and truncated sample lists.

pub mod columns;
pub mod normalize;
pub mod parser;
pub mod reconcile;

pub use columns::ColumnMap;
pub use normalize::{NormalizedStudent, RowRejection};
pub use reconcile::{reconcile, CandidateRow, ImportReport, REPORT_SAMPLE_SIZE};

/// Parse and normalize uploaded text into reconciliation candidates,
/// preserving file order
pub fn prepare(content: &str) -> Vec<CandidateRow> {
    let table = parser::parse_tabular(content);
    let map = ColumnMap::resolve(&table.headers);

    table
        .rows
        .iter()
        .map(|row| {
            let line_number = row.line_number;
            match normalize::normalize_row(&map, &table.headers, row) {
                Ok(record) => CandidateRow {
                    line_number,
                    normalized: Ok(record),
                },
                Err(rejection) => CandidateRow {
                    line_number,
                    normalized: Err(rejection.reason),
                },
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prepare_preserves_order_and_lines() {
        let candidates = prepare(
            "studentNumber,name\n\
             101,Durand\n\
             ,Martin\n\
             103,Bernard\n",
        );
        assert_eq!(candidates.len(), 3);
        assert_eq!(candidates[0].line_number, 2);
        assert!(candidates[0].normalized.is_ok());
        assert_eq!(candidates[1].line_number, 3);
        assert!(candidates[1].normalized.is_err());
        assert_eq!(candidates[2].line_number, 4);
        assert_eq!(
            candidates[2].normalized.as_ref().unwrap().student_number,
            103
        );
    }

    #[test]
    fn test_prepare_empty_input() {
        assert!(prepare("").is_empty());
        assert!(prepare("studentNumber,name\n").is_empty());
    }
}
