//! Column mapping for the notes import format
//!
//! The expected header labels are enumerated here and resolved against
//! the uploaded header exactly once; normalization then works from
//! resolved indices instead of looking strings up per row. Unknown
//! columns are ignored; a missing column simply resolves to `None` and
//! reads as absent downstream.

use scolaris_common::db::SUBJECT_SLOT_COUNT;
use std::collections::HashMap;

/// Header label of the student-number column (the natural key)
pub const STUDENT_NUMBER_HEADER: &str = "studentNumber";

/// Resolved indices of one subject slot's seven columns
#[derive(Debug, Default, Clone)]
pub struct SubjectColumns {
    pub subject_type: Option<usize>,
    pub code: Option<usize>,
    pub label: Option<usize>,
    pub grade: Option<usize>,
    pub outcome: Option<usize>,
    pub session: Option<usize>,
    pub jury_points: Option<usize>,
}

/// Resolved indices of every column the normalizer reads
#[derive(Debug)]
pub struct ColumnMap {
    pub student_number: Option<usize>,
    pub name: Option<usize>,
    pub given_name: Option<usize>,
    pub birth_date: Option<usize>,
    pub program: Option<usize>,
    pub academic_year: Option<usize>,
    pub email: Option<usize>,
    pub group: Option<usize>,
    pub level: Option<usize>,
    pub overall_average: Option<usize>,
    pub overall_result: Option<usize>,
    /// One entry per subject slot, in slot order
    pub subjects: Vec<SubjectColumns>,
}

impl ColumnMap {
    /// Resolve the canonical labels against a parsed header
    pub fn resolve(headers: &[String]) -> ColumnMap {
        // First occurrence wins when a label repeats
        let mut index: HashMap<&str, usize> = HashMap::new();
        for (i, header) in headers.iter().enumerate() {
            index.entry(header.as_str()).or_insert(i);
        }
        let lookup = |label: &str| index.get(label).copied();

        let subjects = (1..=SUBJECT_SLOT_COUNT)
            .map(|slot| SubjectColumns {
                subject_type: lookup(&format!("subject{}Type", slot)),
                code: lookup(&format!("subject{}Code", slot)),
                label: lookup(&format!("subject{}Label", slot)),
                grade: lookup(&format!("subject{}Grade", slot)),
                outcome: lookup(&format!("subject{}Outcome", slot)),
                session: lookup(&format!("subject{}Session", slot)),
                jury_points: lookup(&format!("subject{}JuryPoints", slot)),
            })
            .collect();

        ColumnMap {
            student_number: lookup(STUDENT_NUMBER_HEADER),
            name: lookup("name"),
            given_name: lookup("givenName"),
            birth_date: lookup("birthDate"),
            program: lookup("program"),
            academic_year: lookup("academicYear"),
            email: lookup("email"),
            group: lookup("group"),
            level: lookup("level"),
            overall_average: lookup("overallAverage"),
            overall_result: lookup("overallResult"),
            subjects,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(labels: &[&str]) -> Vec<String> {
        labels.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_scalar_resolution() {
        let map = ColumnMap::resolve(&headers(&[
            "studentNumber",
            "name",
            "givenName",
            "overallAverage",
        ]));
        assert_eq!(map.student_number, Some(0));
        assert_eq!(map.name, Some(1));
        assert_eq!(map.given_name, Some(2));
        assert_eq!(map.overall_average, Some(3));
        assert_eq!(map.birth_date, None);
        assert_eq!(map.email, None);
    }

    #[test]
    fn test_subject_resolution() {
        let map = ColumnMap::resolve(&headers(&[
            "studentNumber",
            "subject1Code",
            "subject1Grade",
            "subject14JuryPoints",
        ]));
        assert_eq!(map.subjects.len(), SUBJECT_SLOT_COUNT);
        assert_eq!(map.subjects[0].code, Some(1));
        assert_eq!(map.subjects[0].grade, Some(2));
        assert_eq!(map.subjects[0].label, None);
        assert_eq!(map.subjects[13].jury_points, Some(3));
        assert_eq!(map.subjects[1].code, None);
    }

    #[test]
    fn test_unknown_columns_ignored() {
        let map = ColumnMap::resolve(&headers(&["mystery", "studentNumber", "alsoUnknown"]));
        assert_eq!(map.student_number, Some(1));
    }

    #[test]
    fn test_duplicate_header_first_occurrence_wins() {
        let map = ColumnMap::resolve(&headers(&["name", "studentNumber", "name"]));
        assert_eq!(map.name, Some(0));
    }
}
