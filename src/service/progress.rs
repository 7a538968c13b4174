use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::blockchain::TokenClient;
use crate::db::{self, course, enrollment, progress};
use crate::models::{Enrollment, MaterialProgress};
use crate::service::rewards::{self, Reward, RewardStatus};
use crate::service::ServiceError;

/// Completion thresholds, checked in this order.
pub const MILESTONES: [u8; 4] = [25, 50, 75, 100];

/// `round(100 * completed / total)`, or 0 for an empty course.
pub fn completion_percentage(completed: i64, total: i64) -> u8 {
    if total <= 0 {
        return 0;
    }
    let completed = completed.clamp(0, total);
    ((completed as f64 * 100.0) / total as f64).round() as u8
}

/// The first threshold crossed by the latest single completion.
///
/// The previous percentage is approximated as `percentage - 100 / total`, so a
/// course whose step does not land on 100 from below 100 only reports the
/// lower threshold it crossed.
pub fn detect_milestone(percentage: u8, total: i64) -> Option<u8> {
    if total <= 0 {
        return None;
    }
    let previous = percentage as f64 - 100.0 / total as f64;
    MILESTONES
        .iter()
        .copied()
        .find(|&m| percentage >= m && previous < m as f64)
}

pub fn reward_points(milestone: u8) -> u32 {
    if milestone == 100 {
        20
    } else {
        milestone as u32 / 5
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionReport {
    pub progress: MaterialProgress,
    pub completion_percentage: u8,
    pub hit_milestone: Option<u8>,
    pub reward: Option<RewardStatus>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseProgress {
    pub enrollment: Enrollment,
    pub total_materials: i64,
    pub completed_materials: i64,
    pub completion_percentage: u8,
    pub materials: Vec<MaterialProgress>,
    pub milestones: Vec<i64>,
}

/// Marks a material complete and reports any newly crossed milestone.
///
/// Progress is committed before the milestone reward is attempted, so a chain
/// failure leaves the completion in place.
pub async fn complete_material(
    pool: &SqlitePool,
    token_client: &dyn TokenClient,
    student_id: i64,
    material_id: i64,
) -> Result<CompletionReport, ServiceError> {
    let mut tx = db::begin_write(pool).await?;

    let existing = progress::find_progress(&mut *tx, student_id, material_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Progress for material {}", material_id)))?;
    let newly_completed = !existing.is_completed;
    let course_id = existing.course_id;

    let updated = progress::mark_completed(&mut *tx, existing.id, db::now_timestamp()).await?;

    let total = course::count_course_materials(&mut *tx, course_id).await?;
    let completed = progress::count_completed(&mut *tx, student_id, course_id).await?;
    let percentage = completion_percentage(completed, total);

    let mut hit_milestone = None;
    if newly_completed {
        if let Some(milestone) = detect_milestone(percentage, total) {
            if progress::record_milestone(&mut *tx, student_id, course_id, milestone, db::now_timestamp())
                .await?
            {
                hit_milestone = Some(milestone);
            } else {
                debug!(
                    "Milestone {}% already reported for student {} in course {}",
                    milestone, student_id, course_id
                );
            }
        }
    }

    if percentage >= 100 {
        enrollment::mark_enrollment_completed(&mut *tx, student_id, course_id).await?;
    }

    let course_title = course::find_course(&mut *tx, course_id)
        .await?
        .map(|c| c.title)
        .unwrap_or_default();

    tx.commit().await?;

    info!(
        "Student {} completed material {} ({}% of course {})",
        student_id, material_id, percentage, course_id
    );

    let reward = match hit_milestone {
        Some(milestone) => {
            let reward = Reward::milestone(milestone, reward_points(milestone), &course_title);
            Some(rewards::reward_student(pool, token_client, student_id, &reward).await)
        }
        None => None,
    };

    Ok(CompletionReport {
        progress: updated,
        completion_percentage: percentage,
        hit_milestone,
        reward,
    })
}

pub async fn course_progress(
    pool: &SqlitePool,
    student_id: i64,
    course_id: i64,
) -> Result<CourseProgress, ServiceError> {
    let mut conn = pool.acquire().await?;

    let enrollment = enrollment::find_enrollment(&mut *conn, student_id, course_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Enrollment".to_string()))?;

    let total_materials = course::count_course_materials(&mut *conn, course_id).await?;
    let completed_materials = progress::count_completed(&mut *conn, student_id, course_id).await?;
    let materials = progress::list_progress(&mut *conn, student_id, course_id).await?;
    let milestones = progress::list_milestones(&mut *conn, student_id, course_id).await?;

    Ok(CourseProgress {
        enrollment,
        total_materials,
        completed_materials,
        completion_percentage: completion_percentage(completed_materials, total_materials),
        materials,
        milestones,
    })
}
