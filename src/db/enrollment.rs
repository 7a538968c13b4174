use sqlx::{SqliteConnection, SqlitePool};

use crate::db::now_timestamp;
use crate::models::{EnrolledCourse, Enrollment, EnrollmentStats, EnrollmentStatus};

pub async fn find_enrollment(
    conn: &mut SqliteConnection,
    student_id: i64,
    course_id: i64,
) -> Result<Option<Enrollment>, sqlx::Error> {
    sqlx::query_as::<_, Enrollment>(
        "SELECT id, student_id, course_id, status, enrolled_at, completed_at
         FROM enrollments WHERE student_id = ? AND course_id = ?",
    )
    .bind(student_id)
    .bind(course_id)
    .fetch_optional(conn)
    .await
}

/// Fails with a unique violation when the pair is already enrolled.
pub async fn insert_enrollment(
    conn: &mut SqliteConnection,
    student_id: i64,
    course_id: i64,
) -> Result<Enrollment, sqlx::Error> {
    sqlx::query_as::<_, Enrollment>(
        "INSERT INTO enrollments (student_id, course_id, status, enrolled_at)
         VALUES (?, ?, ?, ?)
         RETURNING id, student_id, course_id, status, enrolled_at, completed_at",
    )
    .bind(student_id)
    .bind(course_id)
    .bind(EnrollmentStatus::Active)
    .bind(now_timestamp())
    .fetch_one(conn)
    .await
}

/// One incomplete progress row per material the course has right now.
pub async fn snapshot_progress_rows(
    conn: &mut SqliteConnection,
    student_id: i64,
    course_id: i64,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO student_progress (student_id, course_id, section_id, material_id, is_completed)
         SELECT ?, cs.course_id, cm.section_id, cm.id, 0
         FROM course_materials cm
         JOIN course_sections cs ON cm.section_id = cs.id
         WHERE cs.course_id = ?",
    )
    .bind(student_id)
    .bind(course_id)
    .execute(conn)
    .await?;

    Ok(result.rows_affected())
}

/// Gives every student already enrolled in the course a row for a newly added material.
pub async fn backfill_material_progress(
    conn: &mut SqliteConnection,
    course_id: i64,
    section_id: i64,
    material_id: i64,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "INSERT OR IGNORE INTO student_progress
             (student_id, course_id, section_id, material_id, is_completed)
         SELECT e.student_id, e.course_id, ?, ?, 0
         FROM enrollments e
         WHERE e.course_id = ?",
    )
    .bind(section_id)
    .bind(material_id)
    .bind(course_id)
    .execute(conn)
    .await?;

    Ok(result.rows_affected())
}

pub async fn mark_enrollment_completed(
    conn: &mut SqliteConnection,
    student_id: i64,
    course_id: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE enrollments
         SET status = ?, completed_at = COALESCE(completed_at, ?)
         WHERE student_id = ? AND course_id = ?",
    )
    .bind(EnrollmentStatus::Completed)
    .bind(now_timestamp())
    .bind(student_id)
    .bind(course_id)
    .execute(conn)
    .await?;

    Ok(())
}

/// Removes the enrollment together with its progress rows and milestone records.
/// Returns false when there was nothing to remove.
pub async fn delete_enrollment(
    conn: &mut SqliteConnection,
    student_id: i64,
    course_id: i64,
) -> Result<bool, sqlx::Error> {
    sqlx::query("DELETE FROM student_progress WHERE student_id = ? AND course_id = ?")
        .bind(student_id)
        .bind(course_id)
        .execute(&mut *conn)
        .await?;

    sqlx::query("DELETE FROM enrollment_milestones WHERE student_id = ? AND course_id = ?")
        .bind(student_id)
        .bind(course_id)
        .execute(&mut *conn)
        .await?;

    let result = sqlx::query("DELETE FROM enrollments WHERE student_id = ? AND course_id = ?")
        .bind(student_id)
        .bind(course_id)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Enrolled courses with raw completion counts. The caller turns the counts
/// into a percentage.
pub async fn list_enrolled_courses(
    pool: &SqlitePool,
    student_id: i64,
) -> Result<Vec<EnrolledCourse>, sqlx::Error> {
    sqlx::query_as::<_, EnrolledCourse>(
        "SELECT c.id AS course_id, c.title, c.description, e.status, e.enrolled_at,
                (SELECT COUNT(*) FROM student_progress sp
                 JOIN course_materials cm ON sp.material_id = cm.id
                 WHERE sp.student_id = e.student_id AND sp.course_id = c.id
                   AND sp.is_completed = 1) AS completed_materials,
                (SELECT COUNT(*) FROM course_materials cm
                 JOIN course_sections cs ON cm.section_id = cs.id
                 WHERE cs.course_id = c.id) AS total_materials
         FROM enrollments e
         JOIN courses c ON e.course_id = c.id
         WHERE e.student_id = ?
         ORDER BY e.enrolled_at DESC, e.id DESC",
    )
    .bind(student_id)
    .fetch_all(pool)
    .await
}

pub async fn count_course_enrollments(
    conn: &mut SqliteConnection,
    course_id: i64,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM enrollments WHERE course_id = ?")
        .bind(course_id)
        .fetch_one(conn)
        .await
}

pub async fn enrollment_stats(
    conn: &mut SqliteConnection,
    student_id: i64,
) -> Result<EnrollmentStats, sqlx::Error> {
    sqlx::query_as::<_, EnrollmentStats>(
        "SELECT COUNT(*) AS total,
                COALESCE(SUM(CASE WHEN status = 'active' THEN 1 ELSE 0 END), 0) AS active,
                COALESCE(SUM(CASE WHEN status = 'completed' THEN 1 ELSE 0 END), 0) AS completed
         FROM enrollments WHERE student_id = ?",
    )
    .bind(student_id)
    .fetch_one(conn)
    .await
}
