use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::WatchedAddress;

/// All enabled watched addresses, oldest first.
pub async fn get_enabled_addresses(pool: &PgPool) -> anyhow::Result<Vec<WatchedAddress>> {
    let addresses = sqlx::query_as::<_, WatchedAddress>(
        "SELECT * FROM watched_addresses WHERE enabled = true ORDER BY created_at ASC",
    )
    .fetch_all(pool)
    .await?;

    Ok(addresses)
}

pub async fn list_addresses(pool: &PgPool) -> anyhow::Result<Vec<WatchedAddress>> {
    let addresses = sqlx::query_as::<_, WatchedAddress>(
        "SELECT * FROM watched_addresses ORDER BY created_at ASC",
    )
    .fetch_all(pool)
    .await?;

    Ok(addresses)
}

/// Record the latest evaluated transaction. The write is unconditional:
/// explorers do not always report timestamps in order, and a hash that is
/// not stored would be evaluated again next pass.
pub async fn advance_last_seen(
    pool: &PgPool,
    id: Uuid,
    tx_hash: &str,
    tx_time: DateTime<Utc>,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        UPDATE watched_addresses
        SET last_seen_tx_hash = $2, last_seen_tx_time = $3, updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(tx_hash)
    .bind(tx_time)
    .execute(pool)
    .await?;

    Ok(())
}

/// Insert a watched address (used by tests and tooling; the engine itself
/// never creates addresses).
pub async fn insert_address(
    pool: &PgPool,
    chain: &str,
    address: &str,
) -> anyhow::Result<WatchedAddress> {
    let row = sqlx::query_as::<_, WatchedAddress>(
        r#"
        INSERT INTO watched_addresses (chain, address)
        VALUES ($1, lower($2))
        RETURNING *
        "#,
    )
    .bind(chain)
    .bind(address)
    .fetch_one(pool)
    .await?;

    Ok(row)
}
