use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::blockchain::TokenClient;
use crate::db::{self, course, enrollment, student};
use crate::models::{EnrolledCourse, Enrollment};
use crate::service::progress::completion_percentage;
use crate::service::rewards::{self, Reward, RewardStatus};
use crate::service::ServiceError;

#[derive(Debug, Clone, Serialize)]
pub struct EnrollmentReceipt {
    pub enrollment: Enrollment,
    pub progress_rows: u64,
    pub reward: RewardStatus,
}

/// Enrolls the student and snapshots one progress row per current material.
///
/// The enrollment commits before the reward is attempted, so a slow or failed
/// chain call neither blocks other writers nor undoes the enrollment.
pub async fn enroll(
    pool: &SqlitePool,
    token_client: &dyn TokenClient,
    student_id: i64,
    course_id: i64,
) -> Result<EnrollmentReceipt, ServiceError> {
    let (enrollment, progress_rows, course_title) =
        match write_enrollment(pool, student_id, course_id).await {
            Err(ServiceError::Database(e)) if db::is_busy(&e) => {
                return Err(recheck_after_busy(pool, student_id, course_id, e).await)
            }
            other => other?,
        };

    info!(
        "Student {} enrolled in course {} with {} progress rows",
        student_id, course_id, progress_rows
    );

    let reward =
        rewards::reward_student(pool, token_client, student_id, &Reward::enrollment(&course_title))
            .await;

    Ok(EnrollmentReceipt {
        enrollment,
        progress_rows,
        reward,
    })
}

async fn write_enrollment(
    pool: &SqlitePool,
    student_id: i64,
    course_id: i64,
) -> Result<(Enrollment, u64, String), ServiceError> {
    let mut tx = db::begin_write(pool).await?;

    if student::find_student(&mut *tx, student_id).await?.is_none() {
        return Err(ServiceError::NotFound(format!("Student {}", student_id)));
    }

    let course = course::find_active_course(&mut *tx, course_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Active course {}", course_id)))?;

    if enrollment::find_enrollment(&mut *tx, student_id, course_id)
        .await?
        .is_some()
    {
        return Err(ServiceError::AlreadyEnrolled);
    }

    let enrollment = match enrollment::insert_enrollment(&mut *tx, student_id, course_id).await {
        Ok(enrollment) => enrollment,
        Err(e) if db::is_unique_violation(&e) => return Err(ServiceError::AlreadyEnrolled),
        Err(e) => return Err(e.into()),
    };

    let progress_rows = enrollment::snapshot_progress_rows(&mut *tx, student_id, course_id).await?;

    tx.commit().await?;
    Ok((enrollment, progress_rows, course.title))
}

/// A writer that timed out on the lock is only a duplicate if the row is there now.
async fn recheck_after_busy(
    pool: &SqlitePool,
    student_id: i64,
    course_id: i64,
    busy: sqlx::Error,
) -> ServiceError {
    let existing = match pool.acquire().await {
        Ok(mut conn) => enrollment::find_enrollment(&mut *conn, student_id, course_id).await,
        Err(e) => Err(e),
    };
    match existing {
        Ok(Some(_)) => ServiceError::AlreadyEnrolled,
        Ok(None) => ServiceError::Database(busy),
        Err(e) => {
            warn!("Enrollment re-check failed after lock timeout: {}", e);
            ServiceError::Database(busy)
        }
    }
}

/// Drops the enrollment with its progress rows and milestone records.
pub async fn unenroll(pool: &SqlitePool, student_id: i64, course_id: i64) -> Result<(), ServiceError> {
    let mut tx = db::begin_write(pool).await?;

    if !enrollment::delete_enrollment(&mut *tx, student_id, course_id).await? {
        return Err(ServiceError::NotFound("Enrollment".to_string()));
    }

    tx.commit().await?;
    info!("Student {} unenrolled from course {}", student_id, course_id);
    Ok(())
}

pub async fn list_enrolled(pool: &SqlitePool, student_id: i64) -> Result<Vec<EnrolledCourse>, ServiceError> {
    let mut courses = enrollment::list_enrolled_courses(pool, student_id).await?;
    for course in &mut courses {
        course.completion_percentage =
            completion_percentage(course.completed_materials, course.total_materials);
    }
    Ok(courses)
}
