// Catalog queries: courses, their sections, and section materials.

use sqlx::{SqliteConnection, SqlitePool};

use crate::db::now_timestamp;
use crate::models::{Course, CourseSummary, Material, Section};

pub async fn insert_course(
    conn: &mut SqliteConnection,
    title: &str,
    description: Option<&str>,
    is_active: bool,
) -> Result<Course, sqlx::Error> {
    sqlx::query_as::<_, Course>(
        "INSERT INTO courses (title, description, is_active, created_at)
         VALUES (?, ?, ?, ?)
         RETURNING id, title, description, is_active, created_at",
    )
    .bind(title)
    .bind(description)
    .bind(is_active)
    .bind(now_timestamp())
    .fetch_one(conn)
    .await
}

pub async fn insert_section(
    conn: &mut SqliteConnection,
    course_id: i64,
    title: &str,
    order_index: i64,
) -> Result<Section, sqlx::Error> {
    sqlx::query_as::<_, Section>(
        "INSERT INTO course_sections (course_id, title, order_index)
         VALUES (?, ?, ?)
         RETURNING id, course_id, title, order_index",
    )
    .bind(course_id)
    .bind(title)
    .bind(order_index)
    .fetch_one(conn)
    .await
}

pub async fn insert_material(
    conn: &mut SqliteConnection,
    section_id: i64,
    title: &str,
    content_type: &str,
    order_index: i64,
) -> Result<Material, sqlx::Error> {
    sqlx::query_as::<_, Material>(
        "INSERT INTO course_materials (section_id, title, content_type, order_index, created_at)
         VALUES (?, ?, ?, ?, ?)
         RETURNING id, section_id, title, content_type, order_index, created_at",
    )
    .bind(section_id)
    .bind(title)
    .bind(content_type)
    .bind(order_index)
    .bind(now_timestamp())
    .fetch_one(conn)
    .await
}

pub async fn find_course(
    conn: &mut SqliteConnection,
    course_id: i64,
) -> Result<Option<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>(
        "SELECT id, title, description, is_active, created_at FROM courses WHERE id = ?",
    )
    .bind(course_id)
    .fetch_optional(conn)
    .await
}

/// Only courses that accept enrollments.
pub async fn find_active_course(
    conn: &mut SqliteConnection,
    course_id: i64,
) -> Result<Option<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>(
        "SELECT id, title, description, is_active, created_at
         FROM courses WHERE id = ? AND is_active = 1",
    )
    .bind(course_id)
    .fetch_optional(conn)
    .await
}

/// Overwrites only the fields that are `Some`.
pub async fn update_course(
    conn: &mut SqliteConnection,
    course_id: i64,
    title: Option<&str>,
    description: Option<&str>,
    is_active: Option<bool>,
) -> Result<Option<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>(
        "UPDATE courses
         SET title = COALESCE(?, title),
             description = COALESCE(?, description),
             is_active = COALESCE(?, is_active)
         WHERE id = ?
         RETURNING id, title, description, is_active, created_at",
    )
    .bind(title)
    .bind(description)
    .bind(is_active)
    .bind(course_id)
    .fetch_optional(conn)
    .await
}

/// Removes the course with its materials and sections, children first.
/// Returns the number of materials removed.
pub async fn delete_course(conn: &mut SqliteConnection, course_id: i64) -> Result<u64, sqlx::Error> {
    let materials = sqlx::query(
        "DELETE FROM course_materials
         WHERE section_id IN (SELECT id FROM course_sections WHERE course_id = ?)",
    )
    .bind(course_id)
    .execute(&mut *conn)
    .await?
    .rows_affected();

    sqlx::query("DELETE FROM course_sections WHERE course_id = ?")
        .bind(course_id)
        .execute(&mut *conn)
        .await?;

    sqlx::query("DELETE FROM courses WHERE id = ?")
        .bind(course_id)
        .execute(&mut *conn)
        .await?;

    Ok(materials)
}

pub async fn find_section(
    conn: &mut SqliteConnection,
    section_id: i64,
) -> Result<Option<Section>, sqlx::Error> {
    sqlx::query_as::<_, Section>(
        "SELECT id, course_id, title, order_index FROM course_sections WHERE id = ?",
    )
    .bind(section_id)
    .fetch_optional(conn)
    .await
}

pub async fn next_material_index(
    conn: &mut SqliteConnection,
    section_id: i64,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COALESCE(MAX(order_index) + 1, 0) FROM course_materials WHERE section_id = ?",
    )
    .bind(section_id)
    .fetch_one(conn)
    .await
}

pub async fn list_sections(
    conn: &mut SqliteConnection,
    course_id: i64,
) -> Result<Vec<Section>, sqlx::Error> {
    sqlx::query_as::<_, Section>(
        "SELECT id, course_id, title, order_index
         FROM course_sections WHERE course_id = ?
         ORDER BY order_index, id",
    )
    .bind(course_id)
    .fetch_all(conn)
    .await
}

pub async fn list_course_materials(
    conn: &mut SqliteConnection,
    course_id: i64,
) -> Result<Vec<Material>, sqlx::Error> {
    sqlx::query_as::<_, Material>(
        "SELECT cm.id, cm.section_id, cm.title, cm.content_type, cm.order_index, cm.created_at
         FROM course_materials cm
         JOIN course_sections cs ON cm.section_id = cs.id
         WHERE cs.course_id = ?
         ORDER BY cs.order_index, cm.order_index, cm.id",
    )
    .bind(course_id)
    .fetch_all(conn)
    .await
}

/// Live count of the materials currently in the course.
pub async fn count_course_materials(
    conn: &mut SqliteConnection,
    course_id: i64,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM course_materials cm
         JOIN course_sections cs ON cm.section_id = cs.id
         WHERE cs.course_id = ?",
    )
    .bind(course_id)
    .fetch_one(conn)
    .await
}

pub async fn list_active_courses(pool: &SqlitePool) -> Result<Vec<CourseSummary>, sqlx::Error> {
    sqlx::query_as::<_, CourseSummary>(
        "SELECT c.id, c.title, c.description, c.is_active,
                (SELECT COUNT(*) FROM enrollments e WHERE e.course_id = c.id) AS enrollment_count,
                (SELECT COUNT(*) FROM course_materials cm
                 JOIN course_sections cs ON cm.section_id = cs.id
                 WHERE cs.course_id = c.id) AS material_count
         FROM courses c
         WHERE c.is_active = 1
         ORDER BY c.created_at DESC, c.id DESC",
    )
    .fetch_all(pool)
    .await
}
