//! Shared fixtures: in-memory and file-backed pools, seeded rows, and a
//! recording token client.

use async_trait::async_trait;
use sqlx::SqlitePool;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tempfile::TempDir;

use crate::blockchain::{
    AchievementType, ChainReceipt, ClientError, StudentRegistration, StudentSummary, TokenClient,
};
use crate::db::{connection, course, student, wallet};

pub const WALLET: &str = "0xde709f2102306220921060314715629080e2fb77";
pub const OTHER_WALLET: &str = "0x52908400098527886e0f7030069857d2e4169ee7";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AwardCall {
    pub wallet_address: String,
    pub points: String,
    pub description: String,
    pub achievement_type: AchievementType,
}

/// Records every call. `set_failing(true)` makes the chain calls error out and
/// `set_award_delay` stands in for a slow confirmation.
#[derive(Default)]
pub struct MockTokenClient {
    awards: Mutex<Vec<AwardCall>>,
    registrations: Mutex<Vec<StudentRegistration>>,
    registered_emails: Mutex<HashSet<String>>,
    failing: AtomicBool,
    next_block: AtomicU64,
    balance_lookups: AtomicUsize,
    award_delay_ms: AtomicU64,
}

impl MockTokenClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn set_award_delay(&self, delay: Duration) {
        self.award_delay_ms.store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn mark_email_registered(&self, email: &str) {
        self.registered_emails.lock().unwrap().insert(email.to_string());
    }

    pub fn awards(&self) -> Vec<AwardCall> {
        self.awards.lock().unwrap().clone()
    }

    pub fn registrations(&self) -> Vec<StudentRegistration> {
        self.registrations.lock().unwrap().clone()
    }

    pub fn balance_lookups(&self) -> usize {
        self.balance_lookups.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), ClientError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(ClientError::Timeout("mock transaction".to_string()));
        }
        Ok(())
    }

    fn receipt(&self) -> ChainReceipt {
        let block = self.next_block.fetch_add(1, Ordering::SeqCst) + 1;
        ChainReceipt {
            transaction_hash: format!("0x{:064x}", block),
            block_number: Some(block),
            status: Some(1),
        }
    }
}

#[async_trait]
impl TokenClient for MockTokenClient {
    async fn award_points(
        &self,
        wallet_address: &str,
        points: &str,
        description: &str,
        achievement_type: AchievementType,
    ) -> Result<ChainReceipt, ClientError> {
        self.check()?;
        let delay = self.award_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        self.awards.lock().unwrap().push(AwardCall {
            wallet_address: wallet_address.to_string(),
            points: points.to_string(),
            description: description.to_string(),
            achievement_type,
        });
        Ok(self.receipt())
    }

    async fn balance_of(&self, _wallet_address: &str) -> Result<String, ClientError> {
        self.check()?;
        self.balance_lookups.fetch_add(1, Ordering::SeqCst);
        let awarded: u64 = self
            .awards
            .lock()
            .unwrap()
            .iter()
            .filter_map(|a| a.points.parse::<u64>().ok())
            .sum();
        Ok(format!("{}.0", awarded))
    }

    async fn get_student_summary(&self, wallet_address: &str) -> Result<StudentSummary, ClientError> {
        let balance = self.balance_of(wallet_address).await?;
        Ok(StudentSummary {
            is_registered: true,
            total_points_earned: balance.clone(),
            total_points_spent: "0.0".to_string(),
            current_balance: balance,
            staked_points: "0.0".to_string(),
            achievement_count: self.awards.lock().unwrap().len() as u64,
        })
    }

    async fn register_student(&self, registration: &StudentRegistration) -> Result<ChainReceipt, ClientError> {
        self.check()?;
        self.registrations.lock().unwrap().push(registration.clone());
        self.mark_email_registered(&registration.email);
        Ok(self.receipt())
    }

    async fn is_email_registered(&self, email: &str) -> Result<bool, ClientError> {
        self.check()?;
        Ok(self.registered_emails.lock().unwrap().contains(email))
    }

    async fn is_student_id_registered(&self, student_id: &str) -> Result<bool, ClientError> {
        self.check()?;
        Ok(self
            .registrations
            .lock()
            .unwrap()
            .iter()
            .any(|r| r.student_id == student_id))
    }
}

pub async fn setup_pool() -> SqlitePool {
    connection::establish_in_memory()
        .await
        .expect("Failed to create in-memory database")
}

/// A real multi-connection pool on a temporary file. Keep the `TempDir`
/// alive for as long as the pool is used.
pub async fn setup_file_pool() -> (TempDir, SqlitePool) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let url = format!("sqlite://{}", dir.path().join("edupoints.db").display());
    let pool = connection::establish_connection(&url)
        .await
        .expect("Failed to create file database");
    (dir, pool)
}

/// Inserts a student, optionally with `wallet_address` as the primary wallet.
pub async fn seed_student(pool: &SqlitePool, code: &str, wallet_address: Option<&str>) -> i64 {
    let mut conn = pool.acquire().await.unwrap();
    let created = student::insert_student(
        &mut *conn,
        "Test Student",
        &format!("{}@uni.edu", code.to_lowercase()),
        code,
        Some("Computer Science"),
    )
    .await
    .unwrap();

    if let Some(address) = wallet_address {
        wallet::set_primary_wallet(&mut *conn, created.id, address)
            .await
            .unwrap();
    }
    created.id
}

pub struct SeededCourse {
    pub course_id: i64,
    pub section_id: i64,
    pub material_ids: Vec<i64>,
}

/// One section holding `materials` materials.
pub async fn seed_course(pool: &SqlitePool, title: &str, materials: usize, is_active: bool) -> SeededCourse {
    let mut conn = pool.acquire().await.unwrap();
    let created = course::insert_course(&mut *conn, title, None, is_active)
        .await
        .unwrap();
    let section = course::insert_section(&mut *conn, created.id, "Section 1", 0)
        .await
        .unwrap();

    let mut material_ids = Vec::with_capacity(materials);
    for i in 0..materials {
        let material = course::insert_material(&mut *conn, section.id, &format!("Material {}", i + 1), "text", i as i64)
            .await
            .unwrap();
        material_ids.push(material.id);
    }

    SeededCourse {
        course_id: created.id,
        section_id: section.id,
        material_ids,
    }
}

pub async fn count(pool: &SqlitePool, sql: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(sql).fetch_one(pool).await.unwrap()
}
