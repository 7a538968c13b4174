use sqlx::SqliteConnection;

use crate::db::now_timestamp;
use crate::models::Wallet;

pub async fn find_primary_wallet(
    conn: &mut SqliteConnection,
    student_id: i64,
) -> Result<Option<Wallet>, sqlx::Error> {
    sqlx::query_as::<_, Wallet>(
        "SELECT id, student_id, wallet_address, is_primary, created_at
         FROM wallets WHERE student_id = ? AND is_primary = 1",
    )
    .bind(student_id)
    .fetch_optional(conn)
    .await
}

/// Primary wallet first, then oldest.
pub async fn list_wallets(
    conn: &mut SqliteConnection,
    student_id: i64,
) -> Result<Vec<Wallet>, sqlx::Error> {
    sqlx::query_as::<_, Wallet>(
        "SELECT id, student_id, wallet_address, is_primary, created_at
         FROM wallets WHERE student_id = ?
         ORDER BY is_primary DESC, created_at, id",
    )
    .bind(student_id)
    .fetch_all(conn)
    .await
}

pub async fn find_wallet_by_address(
    conn: &mut SqliteConnection,
    wallet_address: &str,
) -> Result<Option<Wallet>, sqlx::Error> {
    sqlx::query_as::<_, Wallet>(
        "SELECT id, student_id, wallet_address, is_primary, created_at
         FROM wallets WHERE wallet_address = ?",
    )
    .bind(wallet_address)
    .fetch_optional(conn)
    .await
}

/// Demotes the student's other wallets and makes `wallet_address` the primary one.
/// The caller must already have checked that no other student owns the address.
pub async fn set_primary_wallet(
    conn: &mut SqliteConnection,
    student_id: i64,
    wallet_address: &str,
) -> Result<Wallet, sqlx::Error> {
    sqlx::query("UPDATE wallets SET is_primary = 0 WHERE student_id = ?")
        .bind(student_id)
        .execute(&mut *conn)
        .await?;

    sqlx::query_as::<_, Wallet>(
        "INSERT INTO wallets (student_id, wallet_address, is_primary, created_at)
         VALUES (?, ?, 1, ?)
         ON CONFLICT(wallet_address) DO UPDATE SET is_primary = 1
         RETURNING id, student_id, wallet_address, is_primary, created_at",
    )
    .bind(student_id)
    .bind(wallet_address)
    .bind(now_timestamp())
    .fetch_one(&mut *conn)
    .await
}
