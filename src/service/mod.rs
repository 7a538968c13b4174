pub mod catalog;
pub mod enrollment;
pub mod progress;
pub mod rewards;
pub mod students;

use crate::blockchain::ClientError;
use crate::validation::ValidationError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("Student is already enrolled in this course")]
    AlreadyEnrolled,

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Blockchain error: {0}")]
    Blockchain(#[from] ClientError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}
