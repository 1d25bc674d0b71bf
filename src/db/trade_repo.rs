use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{NewTrade, Trade, TradeStatus};

/// Insert a trade row. Fails if another non-closed trade already holds the
/// same token.
pub async fn insert_trade(pool: &PgPool, trade: &NewTrade) -> anyhow::Result<Trade> {
    let row = sqlx::query_as::<_, Trade>(
        r#"
        INSERT INTO trades (
            chain, watched_address, wallet_address, follow_buy_tx_hash, follow_buy_time,
            buy_token_address, buy_symbol, buy_token_decimals, follow_buy_amount,
            wallet_buy_tx_hash, wallet_buy_time, wallet_buy_amount, wallet_exit_amount,
            gas_cost, status, failure_reason
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
        RETURNING *
        "#,
    )
    .bind(&trade.chain)
    .bind(&trade.watched_address)
    .bind(&trade.wallet_address)
    .bind(&trade.follow_buy_tx_hash)
    .bind(trade.follow_buy_time)
    .bind(&trade.buy_token_address)
    .bind(&trade.buy_symbol)
    .bind(trade.buy_token_decimals)
    .bind(trade.follow_buy_amount)
    .bind(&trade.wallet_buy_tx_hash)
    .bind(trade.wallet_buy_time)
    .bind(trade.wallet_buy_amount)
    .bind(trade.wallet_exit_amount)
    .bind(trade.gas_cost)
    .bind(trade.status.as_str())
    .bind(&trade.failure_reason)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// The non-closed trade holding `token`, if any.
pub async fn find_unclosed_by_token(pool: &PgPool, token: &str) -> anyhow::Result<Option<Trade>> {
    let trade = sqlx::query_as::<_, Trade>(
        "SELECT * FROM trades WHERE lower(buy_token_address) = lower($1) AND status <> 'closed' LIMIT 1",
    )
    .bind(token)
    .fetch_optional(pool)
    .await?;

    Ok(trade)
}

pub async fn get_open_trades(pool: &PgPool) -> anyhow::Result<Vec<Trade>> {
    let trades = sqlx::query_as::<_, Trade>(
        "SELECT * FROM trades WHERE status = 'open' ORDER BY created_at ASC",
    )
    .fetch_all(pool)
    .await?;

    Ok(trades)
}

/// Open trades whose principal has not been sold yet.
pub async fn get_open_unsold_trades(pool: &PgPool) -> anyhow::Result<Vec<Trade>> {
    let trades = sqlx::query_as::<_, Trade>(
        "SELECT * FROM trades WHERE status = 'open' AND principal_sold = false ORDER BY created_at ASC",
    )
    .fetch_all(pool)
    .await?;

    Ok(trades)
}

pub async fn mark_principal_sold(pool: &PgPool, id: Uuid, tx_hash: &str) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        UPDATE trades
        SET principal_sold = true, principal_sold_tx_hash = $2, updated_at = NOW()
        WHERE id = $1 AND status = 'open'
        "#,
    )
    .bind(id)
    .bind(tx_hash)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn close_trade(pool: &PgPool, id: Uuid) -> anyhow::Result<()> {
    sqlx::query(
        "UPDATE trades SET status = 'closed', updated_at = NOW() WHERE id = $1 AND status = 'open'",
    )
    .bind(id)
    .execute(pool)
    .await?;

    Ok(())
}

/// One page of trades, newest first, with the total matching count.
pub async fn list_trades(
    pool: &PgPool,
    page: i64,
    page_size: i64,
    status: Option<TradeStatus>,
) -> anyhow::Result<(Vec<Trade>, i64)> {
    let offset = page.saturating_sub(1).max(0).saturating_mul(page_size.max(0));
    let status = status.map(|s| s.as_str());

    let trades = sqlx::query_as::<_, Trade>(
        r#"
        SELECT * FROM trades
        WHERE ($1::text IS NULL OR status = $1)
        ORDER BY created_at DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(status)
    .bind(page_size)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let total: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM trades WHERE ($1::text IS NULL OR status = $1)")
            .bind(status)
            .fetch_one(pool)
            .await?;

    Ok((trades, total.0))
}

pub async fn get_trade(pool: &PgPool, id: Uuid) -> anyhow::Result<Option<Trade>> {
    let trade = sqlx::query_as::<_, Trade>("SELECT * FROM trades WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(trade)
}
