//! Best-effort EduPoints issuance.
//!
//! The chain call cannot take part in a database transaction, so its failure
//! never fails the operation that triggered it. Callers commit their own
//! writes first; no connection or lock is held while waiting on the chain.
//! The outcome is reported back as a [`RewardStatus`] and the ledger row is
//! written only after the award is confirmed.

use serde::Serialize;
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::blockchain::{AchievementType, ChainReceipt, ClientError, TokenClient};
use crate::db::{transaction, wallet};
use crate::models::{LedgerEntry, LedgerEntryKind, NewLedgerEntry};

pub const ENROLLMENT_REWARD_POINTS: u32 = 5;

/// A reward about to be issued, with both the on-chain and the ledger wording.
#[derive(Debug, Clone)]
pub struct Reward {
    pub points: u32,
    pub kind: LedgerEntryKind,
    pub chain_description: String,
    pub ledger_description: String,
}

impl Reward {
    pub fn enrollment(course_title: &str) -> Self {
        Self {
            points: ENROLLMENT_REWARD_POINTS,
            kind: LedgerEntryKind::EnrollmentReward,
            chain_description: format!("Enrolled in {}", course_title),
            ledger_description: format!("Enrollment reward for course: {}", course_title),
        }
    }

    pub fn milestone(milestone: u8, points: u32, course_title: &str) -> Self {
        Self {
            points,
            kind: LedgerEntryKind::CourseProgress,
            chain_description: format!("{}% completion of {}", milestone, course_title),
            ledger_description: format!(
                "Reached {}% completion in course: {}",
                milestone, course_title
            ),
        }
    }
}

#[derive(Error, Debug)]
pub enum RewardError {
    #[error("reward issuance failed: {0}")]
    Chain(#[from] ClientError),

    #[error("points issued in {tx_hash} but ledger write failed: {source}")]
    Unrecorded {
        tx_hash: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("reward lookup failed: {0}")]
    Lookup(#[from] sqlx::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RewardStatus {
    Issued {
        points: u32,
        wallet_address: String,
        transaction_hash: String,
    },
    Skipped {
        reason: String,
    },
    Failed {
        points: u32,
        error: String,
    },
}

impl RewardStatus {
    pub fn no_wallet() -> Self {
        RewardStatus::Skipped {
            reason: "student has no primary wallet".to_string(),
        }
    }

    pub fn is_issued(&self) -> bool {
        matches!(self, RewardStatus::Issued { .. })
    }
}

/// Rewards the student's primary wallet, if any.
pub async fn reward_student(
    pool: &SqlitePool,
    token_client: &dyn TokenClient,
    student_id: i64,
    reward: &Reward,
) -> RewardStatus {
    let primary = match pool.acquire().await {
        Ok(mut conn) => wallet::find_primary_wallet(&mut *conn, student_id).await,
        Err(e) => Err(e),
    };

    match primary {
        Ok(Some(wallet)) => {
            let outcome = issue_reward(pool, token_client, &wallet.wallet_address, reward).await;
            settle(outcome, &wallet.wallet_address, reward)
        }
        Ok(None) => {
            warn!(
                "Student {} has no primary wallet; reward skipped ({})",
                student_id, reward.chain_description
            );
            RewardStatus::no_wallet()
        }
        Err(e) => settle(Err(RewardError::Lookup(e)), "unknown", reward),
    }
}

/// Awards the points on chain, then appends the ledger row.
pub async fn issue_reward(
    pool: &SqlitePool,
    token_client: &dyn TokenClient,
    wallet_address: &str,
    reward: &Reward,
) -> Result<(ChainReceipt, LedgerEntry), RewardError> {
    let receipt = token_client
        .award_points(
            wallet_address,
            &reward.points.to_string(),
            &reward.chain_description,
            AchievementType::Academic,
        )
        .await?;

    let entry = NewLedgerEntry {
        wallet_address: wallet_address.to_string(),
        kind: reward.kind,
        amount: reward.points as i64,
        description: reward.ledger_description.clone(),
        tx_hash: Some(receipt.transaction_hash.clone()),
        block_number: receipt.block_number.map(|n| n as i64),
    };

    let recorded = match pool.acquire().await {
        Ok(mut conn) => transaction::add_entry(&mut *conn, &entry).await,
        Err(e) => Err(e),
    }
    .map_err(|source| RewardError::Unrecorded {
        tx_hash: receipt.transaction_hash.clone(),
        source,
    })?;

    Ok((receipt, recorded))
}

/// Turns the outcome into a status, logging and swallowing any failure.
pub fn settle(
    outcome: Result<(ChainReceipt, LedgerEntry), RewardError>,
    wallet_address: &str,
    reward: &Reward,
) -> RewardStatus {
    match outcome {
        Ok((receipt, entry)) => {
            info!(
                wallet = wallet_address,
                points = reward.points,
                ledger_id = entry.id,
                "Recorded reward {}",
                receipt.transaction_hash
            );
            RewardStatus::Issued {
                points: reward.points,
                wallet_address: wallet_address.to_string(),
                transaction_hash: receipt.transaction_hash,
            }
        }
        Err(e) => {
            error!(
                wallet = wallet_address,
                points = reward.points,
                "Error awarding points ({}): {}",
                reward.chain_description,
                e
            );
            RewardStatus::Failed {
                points: reward.points,
                error: e.to_string(),
            }
        }
    }
}
