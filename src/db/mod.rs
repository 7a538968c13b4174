pub mod connection;
pub mod course;
pub mod enrollment;
pub mod migration;
pub mod progress;
pub mod student;
pub mod transaction;
pub mod wallet;

use chrono::Utc;
use sqlx::{Sqlite, SqlitePool, Transaction};

/// Unix seconds; every timestamp column uses this.
pub fn now_timestamp() -> i64 {
    Utc::now().timestamp()
}

/// Opens a transaction that takes the SQLite write lock up front.
///
/// A deferred transaction that reads and then writes cannot wait for a
/// concurrent writer, it fails with SQLITE_BUSY at the upgrade. Taking the
/// lock at `BEGIN` lets the busy timeout queue writers instead.
pub async fn begin_write(pool: &SqlitePool) -> Result<Transaction<'static, Sqlite>, sqlx::Error> {
    pool.begin_with("BEGIN IMMEDIATE").await
}

/// True when a write failed on a UNIQUE / PRIMARY KEY constraint.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.is_unique_violation(),
        _ => false,
    }
}

/// True for SQLITE_BUSY and its extended codes.
pub fn is_busy(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err
            .code()
            .and_then(|code| code.parse::<i32>().ok())
            .map(|code| code & 0xff == 5)
            .unwrap_or(false),
        _ => false,
    }
}
