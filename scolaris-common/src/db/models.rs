//! Database models
//!
//! Wire shapes use camelCase field names; the JSON rendering of a
//! [`Student`] matches the canonical column names of the notes import
//! format (`studentNumber`, `givenName`, `overallAverage`, ...).

use serde::{Deserialize, Serialize};

/// One graded subject entry on a student record
///
/// Records hold an ordered sequence of these; the notes import format
/// supplies exactly [`SUBJECT_SLOT_COUNT`] slots per row, unpopulated
/// slots arriving as empty/zero entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectResult {
    /// 1-based position within the record
    pub slot: i64,
    #[serde(rename = "type")]
    pub subject_type: String,
    pub code: String,
    pub label: String,
    /// 0-20 scale; absent or unparsable grades import as 0
    pub grade: f64,
    pub outcome: String,
    pub session: String,
    /// 0-20 scale; absent or unparsable points import as 0
    pub jury_points: f64,
}

/// Number of subject slots in the notes import format
pub const SUBJECT_SLOT_COUNT: usize = 14;

/// The canonical student record
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: String,
    /// Natural key: unique across the collection, sole reconciliation
    /// key on import
    pub student_number: i64,
    pub name: String,
    pub given_name: String,
    /// Free text, not validated as a calendar date
    pub birth_date: String,
    pub program: String,
    pub academic_year: String,
    pub email: String,
    pub group: String,
    pub level: String,
    /// 0-20 scale
    pub overall_average: f64,
    pub overall_result: String,
    pub subjects: Vec<SubjectResult>,
}

/// Per-record track summary returned by the student tracks listing
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackSummary {
    pub id: String,
    pub academic_year: String,
    pub program: String,
}

/// Administrator account (internal; never serialized with its hash)
#[derive(Debug, Clone)]
pub struct Admin {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub name: String,
}

/// Administrator identity as exposed over the wire
#[derive(Debug, Clone, Serialize)]
pub struct AdminInfo {
    pub id: String,
    pub email: String,
    pub name: String,
}

impl From<&Admin> for AdminInfo {
    fn from(admin: &Admin) -> Self {
        AdminInfo {
            id: admin.id.clone(),
            email: admin.email.clone(),
            name: admin.name.clone(),
        }
    }
}

/// Student identity fields attached to a populated document request
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentSummary {
    pub id: String,
    pub student_number: i64,
    pub name: String,
    pub given_name: String,
    pub birth_date: String,
    pub program: String,
    pub email: String,
}

/// Metadata of a document archived for a completed request
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedDocument {
    pub filename: String,
    pub original_name: String,
    pub path: String,
    pub size: i64,
    pub uploaded_at: String,
}

/// A student's request for an administrative document
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRequest {
    pub id: String,
    pub student_id: String,
    pub document_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_document_type: Option<String>,
    /// One of [`REQUEST_STATUSES`]; set directly by an admin, no
    /// transition logic
    pub status: String,
    pub request_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_date: Option<String>,
    pub admin_notes: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uploaded_document: Option<UploadedDocument>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student: Option<StudentSummary>,
}

/// Accepted document types for a request
pub const DOCUMENT_TYPES: [&str; 7] = [
    "attestation_scolarite",
    "releve_notes",
    "attestation_reussite",
    "certificat_scolarite",
    "attestation_inscription",
    "releve_notes_officiel",
    "autre",
];

/// Request status labels
pub const REQUEST_STATUSES: [&str; 4] = ["pending", "processing", "completed", "rejected"];

pub fn is_valid_document_type(value: &str) -> bool {
    DOCUMENT_TYPES.contains(&value)
}

pub fn is_valid_request_status(value: &str) -> bool {
    REQUEST_STATUSES.contains(&value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_student_wire_shape() {
        let student = Student {
            id: "abc".into(),
            student_number: 22001234,
            name: "Durand".into(),
            given_name: "Éléonore".into(),
            birth_date: "2003-04-12".into(),
            program: "Informatique".into(),
            academic_year: "2024".into(),
            email: "e.durand@example.edu".into(),
            group: "B".into(),
            level: "L3".into(),
            overall_average: 13.5,
            overall_result: "Admis".into(),
            subjects: vec![SubjectResult {
                slot: 1,
                subject_type: "UE".into(),
                code: "INF301".into(),
                label: "Algorithmique avancée".into(),
                grade: 14.0,
                outcome: "Admis".into(),
                session: "2024/1".into(),
                jury_points: 0.0,
            }],
        };

        let json = serde_json::to_value(&student).unwrap();
        assert_eq!(json["studentNumber"], 22001234);
        assert_eq!(json["givenName"], "Éléonore");
        assert_eq!(json["overallAverage"], 13.5);
        assert_eq!(json["subjects"][0]["type"], "UE");
        assert_eq!(json["subjects"][0]["juryPoints"], 0.0);
    }

    #[test]
    fn test_label_validators() {
        assert!(is_valid_document_type("releve_notes"));
        assert!(!is_valid_document_type("diplome"));
        assert!(is_valid_request_status("processing"));
        assert!(!is_valid_request_status("archived"));
    }
}
