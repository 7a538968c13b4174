// Row types for every table the service touches, plus the API request bodies.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Student {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub student_code: String,
    pub department: Option<String>,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Course {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: i64,
}

/// Catalog listing row.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CourseSummary {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub enrollment_count: i64,
    pub material_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Section {
    pub id: i64,
    pub course_id: i64,
    pub title: String,
    pub order_index: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Material {
    pub id: i64,
    pub section_id: i64,
    pub title: String,
    pub content_type: String,
    pub order_index: i64,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SectionDetail {
    #[serde(flatten)]
    pub section: Section,
    pub materials: Vec<Material>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CourseDetail {
    #[serde(flatten)]
    pub course: Course,
    pub sections: Vec<SectionDetail>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum EnrollmentStatus {
    Active,
    Completed,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Enrollment {
    pub id: i64,
    pub student_id: i64,
    pub course_id: i64,
    pub status: EnrollmentStatus,
    pub enrolled_at: i64,
    pub completed_at: Option<i64>,
}

/// One row of `student_progress`: a single material for a single student.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MaterialProgress {
    pub id: i64,
    pub student_id: i64,
    pub course_id: i64,
    pub section_id: i64,
    pub material_id: i64,
    pub is_completed: bool,
    pub completed_at: Option<i64>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct EnrolledCourse {
    pub course_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub status: EnrollmentStatus,
    pub enrolled_at: i64,
    pub completed_materials: i64,
    pub total_materials: i64,
    #[sqlx(skip)]
    pub completion_percentage: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Wallet {
    pub id: i64,
    pub student_id: i64,
    pub wallet_address: String,
    pub is_primary: bool,
    pub created_at: i64,
}

/// Why a ledger row was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum LedgerEntryKind {
    EnrollmentReward,
    CourseProgress,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LedgerEntry {
    pub id: i64,
    pub wallet_address: String,
    pub transaction_type: LedgerEntryKind,
    pub amount: i64,
    pub description: String,
    pub tx_hash: Option<String>,
    pub block_number: Option<i64>,
    pub created_at: i64,
}

/// Enrollment counts shown on a student profile.
#[derive(Debug, Clone, Default, Serialize, FromRow)]
pub struct EnrollmentStats {
    pub total: i64,
    pub active: i64,
    pub completed: i64,
}

/// Totals of the ledger rows written for one wallet.
#[derive(Debug, Clone, Default, Serialize, FromRow)]
pub struct LedgerSummary {
    pub total_points: i64,
    pub entry_count: i64,
}

#[derive(Debug, Clone)]
pub struct NewLedgerEntry {
    pub wallet_address: String,
    pub kind: LedgerEntryKind,
    pub amount: i64,
    pub description: String,
    pub tx_hash: Option<String>,
    pub block_number: Option<i64>,
}

// API request bodies

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterStudentRequest {
    pub name: String,
    pub email: String,
    pub student_code: String,
    pub department: Option<String>,
    pub wallet_address: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConnectWalletRequest {
    pub wallet_address: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCourseRequest {
    pub title: String,
    pub description: Option<String>,
    pub is_active: Option<bool>,
    #[serde(default)]
    pub sections: Vec<NewSection>,
}

/// Absent fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCourseRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewSection {
    pub title: String,
    #[serde(default)]
    pub materials: Vec<NewMaterial>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewMaterial {
    pub title: String,
    pub content_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LedgerQuery {
    pub offset: Option<String>,
    pub limit: Option<String>,
}
