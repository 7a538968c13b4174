// MaterialProgress rows and milestone bookkeeping.

use sqlx::SqliteConnection;

use crate::models::MaterialProgress;

/// The student's row for a material that still exists in the catalog.
pub async fn find_progress(
    conn: &mut SqliteConnection,
    student_id: i64,
    material_id: i64,
) -> Result<Option<MaterialProgress>, sqlx::Error> {
    sqlx::query_as::<_, MaterialProgress>(
        "SELECT sp.id, sp.student_id, sp.course_id, sp.section_id, sp.material_id,
                sp.is_completed, sp.completed_at
         FROM student_progress sp
         JOIN course_materials cm ON sp.material_id = cm.id
         WHERE sp.student_id = ? AND sp.material_id = ?",
    )
    .bind(student_id)
    .bind(material_id)
    .fetch_optional(conn)
    .await
}

/// Keeps the first completion time if the row was already complete.
pub async fn mark_completed(
    conn: &mut SqliteConnection,
    progress_id: i64,
    completed_at: i64,
) -> Result<MaterialProgress, sqlx::Error> {
    sqlx::query_as::<_, MaterialProgress>(
        "UPDATE student_progress
         SET is_completed = 1, completed_at = COALESCE(completed_at, ?)
         WHERE id = ?
         RETURNING id, student_id, course_id, section_id, material_id, is_completed, completed_at",
    )
    .bind(completed_at)
    .bind(progress_id)
    .fetch_one(conn)
    .await
}

/// Completed rows that still join to a live material.
pub async fn count_completed(
    conn: &mut SqliteConnection,
    student_id: i64,
    course_id: i64,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM student_progress sp
         JOIN course_materials cm ON sp.material_id = cm.id
         WHERE sp.student_id = ? AND sp.course_id = ? AND sp.is_completed = 1",
    )
    .bind(student_id)
    .bind(course_id)
    .fetch_one(conn)
    .await
}

pub async fn list_progress(
    conn: &mut SqliteConnection,
    student_id: i64,
    course_id: i64,
) -> Result<Vec<MaterialProgress>, sqlx::Error> {
    sqlx::query_as::<_, MaterialProgress>(
        "SELECT id, student_id, course_id, section_id, material_id, is_completed, completed_at
         FROM student_progress
         WHERE student_id = ? AND course_id = ?
         ORDER BY section_id, material_id",
    )
    .bind(student_id)
    .bind(course_id)
    .fetch_all(conn)
    .await
}

/// Returns true only the first time a milestone is recorded for the enrollment.
pub async fn record_milestone(
    conn: &mut SqliteConnection,
    student_id: i64,
    course_id: i64,
    milestone: u8,
    reached_at: i64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT OR IGNORE INTO enrollment_milestones (student_id, course_id, milestone, reached_at)
         VALUES (?, ?, ?, ?)",
    )
    .bind(student_id)
    .bind(course_id)
    .bind(milestone as i64)
    .bind(reached_at)
    .execute(conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

pub async fn list_milestones(
    conn: &mut SqliteConnection,
    student_id: i64,
    course_id: i64,
) -> Result<Vec<i64>, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT milestone FROM enrollment_milestones
         WHERE student_id = ? AND course_id = ?
         ORDER BY milestone",
    )
    .bind(student_id)
    .bind(course_id)
    .fetch_all(conn)
    .await
}
