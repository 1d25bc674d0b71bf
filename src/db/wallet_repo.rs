use sqlx::PgPool;

use crate::models::ManagedWallet;

const WALLET_COLUMNS: &str = "id, chain, address, secret_key, fixed_exit_amount, enabled";

pub async fn get_enabled_wallets(pool: &PgPool) -> anyhow::Result<Vec<ManagedWallet>> {
    let wallets = sqlx::query_as::<_, ManagedWallet>(&format!(
        "SELECT {WALLET_COLUMNS} FROM managed_wallets WHERE enabled = true ORDER BY created_at ASC"
    ))
    .fetch_all(pool)
    .await?;

    Ok(wallets)
}

pub async fn find_wallet(
    pool: &PgPool,
    chain: &str,
    address: &str,
) -> anyhow::Result<Option<ManagedWallet>> {
    let wallet = sqlx::query_as::<_, ManagedWallet>(&format!(
        "SELECT {WALLET_COLUMNS} FROM managed_wallets WHERE chain = $1 AND lower(address) = lower($2)"
    ))
    .bind(chain)
    .bind(address)
    .fetch_optional(pool)
    .await?;

    Ok(wallet)
}
