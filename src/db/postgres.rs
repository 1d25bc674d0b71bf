use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{address_repo, trade_repo, wallet_repo, DomainStore};
use crate::models::{ManagedWallet, NewTrade, Trade, TradeStatus, WatchedAddress};

/// [`DomainStore`] backed by the Postgres repositories.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl DomainStore for PgStore {
    async fn enabled_watched_addresses(&self) -> anyhow::Result<Vec<WatchedAddress>> {
        address_repo::get_enabled_addresses(&self.pool).await
    }

    async fn list_watched_addresses(&self) -> anyhow::Result<Vec<WatchedAddress>> {
        address_repo::list_addresses(&self.pool).await
    }

    async fn advance_last_seen(
        &self,
        id: Uuid,
        tx_hash: &str,
        tx_time: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        address_repo::advance_last_seen(&self.pool, id, tx_hash, tx_time).await
    }

    async fn enabled_wallets(&self) -> anyhow::Result<Vec<ManagedWallet>> {
        wallet_repo::get_enabled_wallets(&self.pool).await
    }

    async fn find_wallet(
        &self,
        chain: &str,
        address: &str,
    ) -> anyhow::Result<Option<ManagedWallet>> {
        wallet_repo::find_wallet(&self.pool, chain, address).await
    }

    async fn insert_trade(&self, trade: &NewTrade) -> anyhow::Result<Trade> {
        trade_repo::insert_trade(&self.pool, trade).await
    }

    async fn find_unclosed_trade_by_token(&self, token: &str) -> anyhow::Result<Option<Trade>> {
        trade_repo::find_unclosed_by_token(&self.pool, token).await
    }

    async fn open_trades(&self) -> anyhow::Result<Vec<Trade>> {
        trade_repo::get_open_trades(&self.pool).await
    }

    async fn open_trades_pending_exit(&self) -> anyhow::Result<Vec<Trade>> {
        trade_repo::get_open_unsold_trades(&self.pool).await
    }

    async fn mark_principal_sold(&self, id: Uuid, tx_hash: &str) -> anyhow::Result<()> {
        trade_repo::mark_principal_sold(&self.pool, id, tx_hash).await
    }

    async fn close_trade(&self, id: Uuid) -> anyhow::Result<()> {
        trade_repo::close_trade(&self.pool, id).await
    }

    async fn list_trades(
        &self,
        page: i64,
        page_size: i64,
        status: Option<TradeStatus>,
    ) -> anyhow::Result<(Vec<Trade>, i64)> {
        trade_repo::list_trades(&self.pool, page, page_size, status).await
    }

    async fn get_trade(&self, id: Uuid) -> anyhow::Result<Option<Trade>> {
        trade_repo::get_trade(&self.pool, id).await
    }

    async fn ping(&self) -> anyhow::Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
