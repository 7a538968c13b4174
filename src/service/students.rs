use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::info;

use crate::blockchain::{ChainReceipt, StudentRegistration, TokenClient};
use crate::db::{self, enrollment, student, transaction, wallet};
use crate::models::{EnrollmentStats, LedgerSummary, RegisterStudentRequest, Student, Wallet};
use crate::service::ServiceError;
use crate::validation::{validate_email, validate_required, validate_wallet_address};

#[derive(Debug, Clone, Serialize)]
pub struct RegisteredStudent {
    #[serde(flatten)]
    pub student: Student,
    pub wallet: Option<Wallet>,
}

/// A student with wallets, enrollment counts, and the primary wallet's ledger totals.
#[derive(Debug, Clone, Serialize)]
pub struct StudentProfile {
    #[serde(flatten)]
    pub student: Student,
    pub wallets: Vec<Wallet>,
    pub enrollments: EnrollmentStats,
    pub rewards: LedgerSummary,
}

pub async fn register_student(
    pool: &SqlitePool,
    request: &RegisterStudentRequest,
) -> Result<RegisteredStudent, ServiceError> {
    validate_required("name", &request.name)?;
    validate_email(&request.email)?;
    validate_required("student_code", &request.student_code)?;
    let wallet_address = match &request.wallet_address {
        Some(address) => {
            validate_wallet_address(address)?;
            Some(address.to_lowercase())
        }
        None => None,
    };

    let mut tx = db::begin_write(pool).await?;

    let created = match student::insert_student(
        &mut *tx,
        request.name.trim(),
        &request.email.trim().to_lowercase(),
        request.student_code.trim(),
        request.department.as_deref(),
    )
    .await
    {
        Ok(created) => created,
        Err(e) if db::is_unique_violation(&e) => {
            return Err(ServiceError::Conflict(
                "A student with this email or student code already exists".to_string(),
            ))
        }
        Err(e) => return Err(e.into()),
    };

    let primary = match wallet_address {
        Some(address) => Some(claim_wallet(&mut *tx, created.id, &address).await?),
        None => None,
    };

    tx.commit().await?;
    info!("Registered student {} ({})", created.id, created.student_code);

    Ok(RegisteredStudent {
        student: created,
        wallet: primary,
    })
}

/// Makes the address the student's primary wallet, demoting any previous one.
pub async fn connect_wallet(
    pool: &SqlitePool,
    student_id: i64,
    wallet_address: &str,
) -> Result<Wallet, ServiceError> {
    validate_wallet_address(wallet_address)?;
    let address = wallet_address.to_lowercase();

    let mut tx = db::begin_write(pool).await?;

    if student::find_student(&mut *tx, student_id).await?.is_none() {
        return Err(ServiceError::NotFound(format!("Student {}", student_id)));
    }

    let connected = claim_wallet(&mut *tx, student_id, &address).await?;
    tx.commit().await?;

    info!("Student {} connected primary wallet {}", student_id, address);
    Ok(connected)
}

async fn claim_wallet(
    conn: &mut SqliteConnection,
    student_id: i64,
    address: &str,
) -> Result<Wallet, ServiceError> {
    if let Some(existing) = wallet::find_wallet_by_address(&mut *conn, address).await? {
        if existing.student_id != student_id {
            return Err(ServiceError::Conflict(
                "Wallet address is already connected to another student".to_string(),
            ));
        }
    }

    Ok(wallet::set_primary_wallet(conn, student_id, address).await?)
}

pub async fn student_profile(pool: &SqlitePool, student_id: i64) -> Result<StudentProfile, ServiceError> {
    let mut conn = pool.acquire().await?;

    let found = student::find_student(&mut *conn, student_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Student {}", student_id)))?;
    let wallets = wallet::list_wallets(&mut *conn, student_id).await?;
    let enrollments = enrollment::enrollment_stats(&mut *conn, student_id).await?;

    let rewards = match wallets.iter().find(|w| w.is_primary) {
        Some(primary) => transaction::summarize(&mut *conn, &primary.wallet_address).await?,
        None => LedgerSummary::default(),
    };

    Ok(StudentProfile {
        student: found,
        wallets,
        enrollments,
        rewards,
    })
}

/// Registers the student's profile on the EduPoints contract. Unlike rewards,
/// chain failures here are returned to the caller.
pub async fn register_on_chain(
    pool: &SqlitePool,
    token_client: &dyn TokenClient,
    student_id: i64,
) -> Result<ChainReceipt, ServiceError> {
    let mut conn = pool.acquire().await?;

    let profile = student::find_student(&mut *conn, student_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Student {}", student_id)))?;
    let primary = wallet::find_primary_wallet(&mut *conn, student_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Primary wallet".to_string()))?;
    drop(conn);

    if token_client.is_email_registered(&profile.email).await? {
        return Err(ServiceError::Conflict("Email is already registered on chain".to_string()));
    }
    if token_client.is_student_id_registered(&profile.student_code).await? {
        return Err(ServiceError::Conflict(
            "Student code is already registered on chain".to_string(),
        ));
    }

    let registration = StudentRegistration {
        name: profile.name,
        email: profile.email,
        student_id: profile.student_code,
        department: profile.department.unwrap_or_default(),
        wallet_address: primary.wallet_address,
    };

    let receipt = token_client.register_student(&registration).await?;
    info!(
        "Student {} registered on chain in {}",
        student_id, receipt.transaction_hash
    );
    Ok(receipt)
}
