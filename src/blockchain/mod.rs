pub mod client;
pub mod models;

// Re-exports for convenience
pub use client::{ClientError, EduPointsClient, TokenClient};
pub use models::{AchievementType, ChainReceipt, StudentRegistration, StudentSummary};
