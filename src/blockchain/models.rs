use serde::{Deserialize, Serialize};

/// Achievement category recorded on chain with every award.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum AchievementType {
    Academic = 0,
    Skills = 1,
    Leadership = 2,
    Community = 3,
}

impl AchievementType {
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for AchievementType {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Academic),
            1 => Ok(Self::Skills),
            2 => Ok(Self::Leadership),
            3 => Ok(Self::Community),
            other => Err(other),
        }
    }
}

/// Outcome of a confirmed contract transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainReceipt {
    pub transaction_hash: String,
    pub block_number: Option<u64>,
    pub status: Option<u64>,
}

/// `getStudentSummary` result. Token amounts are decimal strings in whole EduPoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentSummary {
    pub is_registered: bool,
    pub total_points_earned: String,
    pub total_points_spent: String,
    pub current_balance: String,
    pub staked_points: String,
    pub achievement_count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentRegistration {
    pub name: String,
    pub email: String,
    pub student_id: String,
    pub department: String,
    pub wallet_address: String,
}
