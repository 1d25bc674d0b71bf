pub mod address_repo;
pub mod memory;
pub mod postgres;
pub mod trade_repo;
pub mod wallet_repo;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{ManagedWallet, NewTrade, Trade, TradeStatus, WatchedAddress};

pub async fn init_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    // Verify connectivity
    sqlx::query("SELECT 1").execute(&pool).await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}

/// Durable records the pipeline reads and writes.
#[async_trait]
pub trait DomainStore: Send + Sync {
    async fn enabled_watched_addresses(&self) -> anyhow::Result<Vec<WatchedAddress>>;

    async fn list_watched_addresses(&self) -> anyhow::Result<Vec<WatchedAddress>>;

    /// Record `tx_hash` as the last transaction evaluated for the address,
    /// whatever its timestamp.
    async fn advance_last_seen(
        &self,
        id: Uuid,
        tx_hash: &str,
        tx_time: DateTime<Utc>,
    ) -> anyhow::Result<()>;

    async fn enabled_wallets(&self) -> anyhow::Result<Vec<ManagedWallet>>;

    async fn find_wallet(&self, chain: &str, address: &str)
        -> anyhow::Result<Option<ManagedWallet>>;

    /// Rejects a second non-closed trade for the same token.
    async fn insert_trade(&self, trade: &NewTrade) -> anyhow::Result<Trade>;

    /// Any non-closed (open or failed) trade for `token`, case-insensitive.
    async fn find_unclosed_trade_by_token(&self, token: &str) -> anyhow::Result<Option<Trade>>;

    async fn open_trades(&self) -> anyhow::Result<Vec<Trade>>;

    /// Open trades that still hold their principal.
    async fn open_trades_pending_exit(&self) -> anyhow::Result<Vec<Trade>>;

    async fn mark_principal_sold(&self, id: Uuid, tx_hash: &str) -> anyhow::Result<()>;

    async fn close_trade(&self, id: Uuid) -> anyhow::Result<()>;

    /// 1-based page of trades, newest first, plus the total count.
    async fn list_trades(
        &self,
        page: i64,
        page_size: i64,
        status: Option<TradeStatus>,
    ) -> anyhow::Result<(Vec<Trade>, i64)>;

    async fn get_trade(&self, id: Uuid) -> anyhow::Result<Option<Trade>>;

    async fn ping(&self) -> anyhow::Result<()>;
}
