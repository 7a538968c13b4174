use serde::Serialize;
use sqlx::SqlitePool;
use tracing::info;

use crate::db::{self, course, enrollment};
use crate::models::{
    Course, CourseDetail, CourseSummary, CreateCourseRequest, Material, NewMaterial, SectionDetail,
    UpdateCourseRequest,
};
use crate::service::ServiceError;
use crate::validation::validate_required;

const DEFAULT_CONTENT_TYPE: &str = "text";

#[derive(Debug, Clone, Serialize)]
pub struct MaterialAdded {
    pub material: Material,
    pub backfilled_rows: u64,
}

/// Creates the course with all of its sections and materials, or nothing.
pub async fn create_course(pool: &SqlitePool, request: &CreateCourseRequest) -> Result<CourseDetail, ServiceError> {
    validate_required("title", &request.title)?;
    for section in &request.sections {
        validate_required("section title", &section.title)?;
        for material in &section.materials {
            validate_required("material title", &material.title)?;
        }
    }

    let mut tx = db::begin_write(pool).await?;

    let created = course::insert_course(
        &mut *tx,
        request.title.trim(),
        request.description.as_deref(),
        request.is_active.unwrap_or(true),
    )
    .await?;

    let mut sections = Vec::with_capacity(request.sections.len());
    for (section_index, new_section) in request.sections.iter().enumerate() {
        let section =
            course::insert_section(&mut *tx, created.id, new_section.title.trim(), section_index as i64).await?;

        let mut materials = Vec::with_capacity(new_section.materials.len());
        for (material_index, new_material) in new_section.materials.iter().enumerate() {
            let material = course::insert_material(
                &mut *tx,
                section.id,
                new_material.title.trim(),
                content_type(new_material),
                material_index as i64,
            )
            .await?;
            materials.push(material);
        }

        sections.push(SectionDetail { section, materials });
    }

    tx.commit().await?;

    info!("Created course {} '{}' with {} sections", created.id, created.title, sections.len());

    Ok(CourseDetail {
        course: created,
        sections,
    })
}

pub async fn list_active_courses(pool: &SqlitePool) -> Result<Vec<CourseSummary>, ServiceError> {
    Ok(course::list_active_courses(pool).await?)
}

pub async fn course_detail(pool: &SqlitePool, course_id: i64) -> Result<CourseDetail, ServiceError> {
    let mut conn = pool.acquire().await?;

    let found = course::find_course(&mut *conn, course_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Course {}", course_id)))?;

    let sections = course::list_sections(&mut *conn, course_id).await?;
    let materials = course::list_course_materials(&mut *conn, course_id).await?;

    let sections = sections
        .into_iter()
        .map(|section| {
            let materials = materials
                .iter()
                .filter(|m| m.section_id == section.id)
                .cloned()
                .collect();
            SectionDetail { section, materials }
        })
        .collect();

    Ok(CourseDetail {
        course: found,
        sections,
    })
}

/// Changes title, description or active flag. Deactivating a course stops new
/// enrollments but leaves existing ones untouched.
pub async fn update_course(
    pool: &SqlitePool,
    course_id: i64,
    request: &UpdateCourseRequest,
) -> Result<Course, ServiceError> {
    if let Some(title) = &request.title {
        validate_required("title", title)?;
    }
    let title = request.title.as_deref().map(str::trim);

    let mut tx = db::begin_write(pool).await?;
    let updated = course::update_course(
        &mut *tx,
        course_id,
        title,
        request.description.as_deref(),
        request.is_active,
    )
    .await?
    .ok_or_else(|| ServiceError::NotFound(format!("Course {}", course_id)))?;
    tx.commit().await?;

    info!("Updated course {} (active: {})", updated.id, updated.is_active);
    Ok(updated)
}

/// Deletes a course nobody is enrolled in, together with its sections and materials.
pub async fn delete_course(pool: &SqlitePool, course_id: i64) -> Result<(), ServiceError> {
    let mut tx = db::begin_write(pool).await?;

    if course::find_course(&mut *tx, course_id).await?.is_none() {
        return Err(ServiceError::NotFound(format!("Course {}", course_id)));
    }

    let enrolled = enrollment::count_course_enrollments(&mut *tx, course_id).await?;
    if enrolled > 0 {
        return Err(ServiceError::Conflict(format!(
            "Course {} has {} enrollments and cannot be deleted",
            course_id, enrolled
        )));
    }

    let materials = course::delete_course(&mut *tx, course_id).await?;
    tx.commit().await?;

    info!("Deleted course {} with {} materials", course_id, materials);
    Ok(())
}

/// Appends a material to a section and gives every enrolled student a progress
/// row for it, so completion percentages keep counting against the live set.
pub async fn add_material(
    pool: &SqlitePool,
    section_id: i64,
    new_material: &NewMaterial,
) -> Result<MaterialAdded, ServiceError> {
    validate_required("title", &new_material.title)?;

    let mut tx = db::begin_write(pool).await?;

    let section = course::find_section(&mut *tx, section_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Section {}", section_id)))?;

    let order_index = course::next_material_index(&mut *tx, section_id).await?;
    let material = course::insert_material(
        &mut *tx,
        section_id,
        new_material.title.trim(),
        content_type(new_material),
        order_index,
    )
    .await?;

    let backfilled_rows =
        enrollment::backfill_material_progress(&mut *tx, section.course_id, section_id, material.id).await?;

    tx.commit().await?;

    info!(
        "Added material {} to section {} (course {}), backfilled {} progress rows",
        material.id, section_id, section.course_id, backfilled_rows
    );

    Ok(MaterialAdded {
        material,
        backfilled_rows,
    })
}

fn content_type(material: &NewMaterial) -> &str {
    material
        .content_type
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .unwrap_or(DEFAULT_CONTENT_TYPE)
}
