// Append-only reward ledger (`transactions` table). Nothing here updates or
// deletes a row.

use sqlx::{Row, SqliteConnection, SqlitePool};

use crate::db::now_timestamp;
use crate::models::{LedgerEntry, LedgerEntryKind, LedgerSummary, NewLedgerEntry};

pub async fn add_entry(
    conn: &mut SqliteConnection,
    entry: &NewLedgerEntry,
) -> Result<LedgerEntry, sqlx::Error> {
    sqlx::query_as::<_, LedgerEntry>(
        r#"
        INSERT INTO transactions
        (wallet_address, transaction_type, amount, description, tx_hash, block_number, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        RETURNING id, wallet_address, transaction_type, amount, description,
                  tx_hash, block_number, created_at
        "#,
    )
    .bind(&entry.wallet_address)
    .bind(entry.kind)
    .bind(entry.amount)
    .bind(&entry.description)
    .bind(&entry.tx_hash)
    .bind(entry.block_number)
    .bind(now_timestamp())
    .fetch_one(conn)
    .await
}

/// Newest first. Returns the page and the wallet's total entry count.
pub async fn get_entries(
    pool: &SqlitePool,
    wallet_address: &str,
    offset: i64,
    limit: i64,
) -> Result<(Vec<LedgerEntry>, i64), sqlx::Error> {
    let total_count = count_entries(pool, wallet_address).await?;

    let rows = sqlx::query(
        r#"SELECT id, wallet_address, transaction_type, amount, description,
                  tx_hash, block_number, created_at
           FROM transactions
           WHERE wallet_address = ?
           ORDER BY created_at DESC, id DESC
           LIMIT ? OFFSET ?"#,
    )
    .bind(wallet_address)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let entries = rows
        .iter()
        .map(|row| LedgerEntry {
            id: row.get("id"),
            wallet_address: row.get("wallet_address"),
            transaction_type: row.get::<LedgerEntryKind, _>("transaction_type"),
            amount: row.get("amount"),
            description: row.get("description"),
            tx_hash: row.get("tx_hash"),
            block_number: row.get("block_number"),
            created_at: row.get("created_at"),
        })
        .collect();

    Ok((entries, total_count))
}

pub async fn count_entries(pool: &SqlitePool, wallet_address: &str) -> Result<i64, sqlx::Error> {
    let count = sqlx::query("SELECT COUNT(*) FROM transactions WHERE wallet_address = ?")
        .bind(wallet_address)
        .fetch_one(pool)
        .await?
        .get::<i64, _>(0);

    Ok(count)
}

pub async fn summarize(
    conn: &mut SqliteConnection,
    wallet_address: &str,
) -> Result<LedgerSummary, sqlx::Error> {
    sqlx::query_as::<_, LedgerSummary>(
        "SELECT COALESCE(SUM(amount), 0) AS total_points, COUNT(*) AS entry_count
         FROM transactions WHERE wallet_address = ?",
    )
    .bind(wallet_address)
    .fetch_one(conn)
    .await
}
