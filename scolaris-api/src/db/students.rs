//! Student store queries
//!
//! Records are a `students` row plus ordered `subject_results` child
//! rows. Import writes are transactional: an insert creates the row and
//! all its subject entries together, and a replace overwrites the row
//! and swaps the full subject set — partial field merging is not
//! supported anywhere on the import path.

use crate::import::NormalizedStudent;
use chrono::Utc;
use scolaris_common::db::{Student, SubjectResult, TrackSummary};
use scolaris_common::Result;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::collections::HashMap;
use uuid::Uuid;

const STUDENT_COLUMNS: &str = "id, student_number, name, given_name, birth_date, program, \
     academic_year, email, student_group, level, overall_average, overall_result";

/// Identity fields an admin may edit directly; `None` leaves a field
/// unchanged. The academic payload is only ever written by the import.
#[derive(Debug, Default)]
pub struct IdentityUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub program: Option<String>,
    pub academic_year: Option<String>,
    pub level: Option<String>,
    pub group: Option<String>,
}

fn student_from_row(row: &SqliteRow) -> Student {
    Student {
        id: row.get("id"),
        student_number: row.get("student_number"),
        name: row.get("name"),
        given_name: row.get("given_name"),
        birth_date: row.get("birth_date"),
        program: row.get("program"),
        academic_year: row.get("academic_year"),
        email: row.get("email"),
        group: row.get("student_group"),
        level: row.get("level"),
        overall_average: row.get("overall_average"),
        overall_result: row.get("overall_result"),
        subjects: Vec::new(),
    }
}

fn subject_from_row(row: &SqliteRow) -> SubjectResult {
    SubjectResult {
        slot: row.get("slot"),
        subject_type: row.get("subject_type"),
        code: row.get("code"),
        label: row.get("label"),
        grade: row.get("grade"),
        outcome: row.get("outcome"),
        session: row.get("session"),
        jury_points: row.get("jury_points"),
    }
}

async fn attach_subjects(pool: &SqlitePool, mut student: Student) -> Result<Student> {
    let rows = sqlx::query(
        "SELECT slot, subject_type, code, label, grade, outcome, session, jury_points \
         FROM subject_results WHERE student_id = ? ORDER BY slot",
    )
    .bind(&student.id)
    .fetch_all(pool)
    .await?;

    student.subjects = rows.iter().map(subject_from_row).collect();
    Ok(student)
}

/// Look a record up by its natural key
pub async fn find_by_number(pool: &SqlitePool, student_number: i64) -> Result<Option<Student>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM students WHERE student_number = ?",
        STUDENT_COLUMNS
    ))
    .bind(student_number)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => Ok(Some(attach_subjects(pool, student_from_row(&row)).await?)),
        None => Ok(None),
    }
}

pub async fn find_by_id(pool: &SqlitePool, id: &str) -> Result<Option<Student>> {
    let row = sqlx::query(&format!("SELECT {} FROM students WHERE id = ?", STUDENT_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    match row {
        Some(row) => Ok(Some(attach_subjects(pool, student_from_row(&row)).await?)),
        None => Ok(None),
    }
}

/// Ownership-scoped lookup: the record must match both the id and the
/// caller's student number
pub async fn find_by_id_and_number(
    pool: &SqlitePool,
    id: &str,
    student_number: i64,
) -> Result<Option<Student>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM students WHERE id = ? AND student_number = ?",
        STUDENT_COLUMNS
    ))
    .bind(id)
    .bind(student_number)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => Ok(Some(attach_subjects(pool, student_from_row(&row)).await?)),
        None => Ok(None),
    }
}

/// Login lookup: number and birth date must both match
pub async fn find_by_number_and_birth_date(
    pool: &SqlitePool,
    student_number: i64,
    birth_date: &str,
) -> Result<Option<Student>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM students WHERE student_number = ? AND birth_date = ?",
        STUDENT_COLUMNS
    ))
    .bind(student_number)
    .bind(birth_date)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => Ok(Some(attach_subjects(pool, student_from_row(&row)).await?)),
        None => Ok(None),
    }
}

/// Full listing with subjects, for the admin dashboard
pub async fn list_all(pool: &SqlitePool) -> Result<Vec<Student>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM students ORDER BY student_number",
        STUDENT_COLUMNS
    ))
    .fetch_all(pool)
    .await?;
    let mut students: Vec<Student> = rows.iter().map(student_from_row).collect();

    let subject_rows = sqlx::query(
        "SELECT student_id, slot, subject_type, code, label, grade, outcome, session, jury_points \
         FROM subject_results ORDER BY student_id, slot",
    )
    .fetch_all(pool)
    .await?;

    let mut by_student: HashMap<String, Vec<SubjectResult>> = HashMap::new();
    for row in &subject_rows {
        by_student
            .entry(row.get("student_id"))
            .or_default()
            .push(subject_from_row(row));
    }
    for student in &mut students {
        if let Some(subjects) = by_student.remove(&student.id) {
            student.subjects = subjects;
        }
    }

    Ok(students)
}

/// Track summaries for the student's own records, with the listing
/// defaults applied for blank years and programs
pub async fn tracks_for_number(pool: &SqlitePool, student_number: i64) -> Result<Vec<TrackSummary>> {
    let rows = sqlx::query_as::<_, (String, String, String)>(
        "SELECT id, academic_year, program FROM students WHERE student_number = ?",
    )
    .bind(student_number)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(id, academic_year, program)| TrackSummary {
            id,
            academic_year: if academic_year.is_empty() {
                "2024".to_string()
            } else {
                academic_year
            },
            program: if program.is_empty() {
                "Unknown".to_string()
            } else {
                program
            },
        })
        .collect())
}

/// Create a record from a normalized import payload
pub async fn insert(pool: &SqlitePool, record: &NormalizedStudent) -> Result<()> {
    let id = Uuid::new_v4().to_string();
    let now = Utc::now().to_rfc3339();

    let mut tx = pool.begin().await?;

    sqlx::query(
        "INSERT INTO students \
         (id, student_number, name, given_name, birth_date, program, academic_year, email, \
          student_group, level, overall_average, overall_result, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(record.student_number)
    .bind(&record.name)
    .bind(&record.given_name)
    .bind(&record.birth_date)
    .bind(&record.program)
    .bind(&record.academic_year)
    .bind(&record.email)
    .bind(&record.group)
    .bind(&record.level)
    .bind(record.overall_average)
    .bind(&record.overall_result)
    .bind(&now)
    .bind(&now)
    .execute(&mut *tx)
    .await?;

    insert_subjects(&mut tx, &id, &record.subjects).await?;

    tx.commit().await?;
    Ok(())
}

/// Full-replace update: overwrite every field and swap the entire
/// subject set
pub async fn replace(pool: &SqlitePool, id: &str, record: &NormalizedStudent) -> Result<()> {
    let now = Utc::now().to_rfc3339();

    let mut tx = pool.begin().await?;

    sqlx::query(
        "UPDATE students SET student_number = ?, name = ?, given_name = ?, birth_date = ?, \
         program = ?, academic_year = ?, email = ?, student_group = ?, level = ?, \
         overall_average = ?, overall_result = ?, updated_at = ? \
         WHERE id = ?",
    )
    .bind(record.student_number)
    .bind(&record.name)
    .bind(&record.given_name)
    .bind(&record.birth_date)
    .bind(&record.program)
    .bind(&record.academic_year)
    .bind(&record.email)
    .bind(&record.group)
    .bind(&record.level)
    .bind(record.overall_average)
    .bind(&record.overall_result)
    .bind(&now)
    .bind(id)
    .execute(&mut *tx)
    .await?;

    sqlx::query("DELETE FROM subject_results WHERE student_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    insert_subjects(&mut tx, id, &record.subjects).await?;

    tx.commit().await?;
    Ok(())
}

async fn insert_subjects(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    student_id: &str,
    subjects: &[SubjectResult],
) -> Result<()> {
    for subject in subjects {
        sqlx::query(
            "INSERT INTO subject_results \
             (student_id, slot, subject_type, code, label, grade, outcome, session, jury_points) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(student_id)
        .bind(subject.slot)
        .bind(&subject.subject_type)
        .bind(&subject.code)
        .bind(&subject.label)
        .bind(subject.grade)
        .bind(&subject.outcome)
        .bind(&subject.session)
        .bind(subject.jury_points)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

/// Update the editable identity fields; returns the refreshed record,
/// or `None` when the id is unknown
pub async fn update_identity(
    pool: &SqlitePool,
    id: &str,
    update: &IdentityUpdate,
) -> Result<Option<Student>> {
    let now = Utc::now().to_rfc3339();

    let result = sqlx::query(
        "UPDATE students SET \
         name = COALESCE(?, name), \
         email = COALESCE(?, email), \
         program = COALESCE(?, program), \
         academic_year = COALESCE(?, academic_year), \
         level = COALESCE(?, level), \
         student_group = COALESCE(?, student_group), \
         updated_at = ? \
         WHERE id = ?",
    )
    .bind(&update.name)
    .bind(&update.email)
    .bind(&update.program)
    .bind(&update.academic_year)
    .bind(&update.level)
    .bind(&update.group)
    .bind(&now)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    find_by_id(pool, id).await
}
