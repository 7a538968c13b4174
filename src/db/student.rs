use sqlx::SqliteConnection;

use crate::db::now_timestamp;
use crate::models::Student;

pub async fn insert_student(
    conn: &mut SqliteConnection,
    name: &str,
    email: &str,
    student_code: &str,
    department: Option<&str>,
) -> Result<Student, sqlx::Error> {
    sqlx::query_as::<_, Student>(
        "INSERT INTO students (name, email, student_code, department, created_at)
         VALUES (?, ?, ?, ?, ?)
         RETURNING id, name, email, student_code, department, created_at",
    )
    .bind(name)
    .bind(email)
    .bind(student_code)
    .bind(department)
    .bind(now_timestamp())
    .fetch_one(conn)
    .await
}

pub async fn find_student(
    conn: &mut SqliteConnection,
    student_id: i64,
) -> Result<Option<Student>, sqlx::Error> {
    sqlx::query_as::<_, Student>(
        "SELECT id, name, email, student_code, department, created_at
         FROM students WHERE id = ?",
    )
    .bind(student_id)
    .fetch_optional(conn)
    .await
}
