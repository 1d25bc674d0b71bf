use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::DomainStore;
use crate::models::{
    normalize_address, ManagedWallet, NewTrade, Trade, TradeStatus, WatchedAddress,
};

#[derive(Default)]
struct Tables {
    addresses: Vec<WatchedAddress>,
    wallets: Vec<ManagedWallet>,
    trades: Vec<Trade>,
}

/// In-process [`DomainStore`] with the same constraints as the Postgres
/// schema. Used by the test suite and for dry runs without a database.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_address(&self, chain: &str, address: &str) -> WatchedAddress {
        let now = Utc::now();
        let row = WatchedAddress {
            id: Uuid::new_v4(),
            chain: chain.to_string(),
            address: normalize_address(address),
            last_seen_tx_hash: None,
            last_seen_tx_time: None,
            enabled: true,
            created_at: Some(now),
            updated_at: Some(now),
        };
        self.tables.lock().await.addresses.push(row.clone());
        row
    }

    pub async fn add_wallet(&self, wallet: ManagedWallet) {
        self.tables.lock().await.wallets.push(wallet);
    }

    pub async fn address(&self, id: Uuid) -> Option<WatchedAddress> {
        self.tables
            .lock()
            .await
            .addresses
            .iter()
            .find(|a| a.id == id)
            .cloned()
    }

    /// Snapshot of every trade in insertion order.
    pub async fn trades(&self) -> Vec<Trade> {
        self.tables.lock().await.trades.clone()
    }
}

#[async_trait]
impl DomainStore for MemoryStore {
    async fn enabled_watched_addresses(&self) -> anyhow::Result<Vec<WatchedAddress>> {
        let tables = self.tables.lock().await;
        Ok(tables.addresses.iter().filter(|a| a.enabled).cloned().collect())
    }

    async fn list_watched_addresses(&self) -> anyhow::Result<Vec<WatchedAddress>> {
        Ok(self.tables.lock().await.addresses.clone())
    }

    async fn advance_last_seen(
        &self,
        id: Uuid,
        tx_hash: &str,
        tx_time: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        let mut tables = self.tables.lock().await;
        if let Some(row) = tables.addresses.iter_mut().find(|a| a.id == id) {
            row.last_seen_tx_hash = Some(tx_hash.to_string());
            row.last_seen_tx_time = Some(tx_time);
            row.updated_at = Some(Utc::now());
        }
        Ok(())
    }

    async fn enabled_wallets(&self) -> anyhow::Result<Vec<ManagedWallet>> {
        let tables = self.tables.lock().await;
        Ok(tables.wallets.iter().filter(|w| w.enabled).cloned().collect())
    }

    async fn find_wallet(
        &self,
        chain: &str,
        address: &str,
    ) -> anyhow::Result<Option<ManagedWallet>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .wallets
            .iter()
            .find(|w| w.chain == chain && w.address.eq_ignore_ascii_case(address))
            .cloned())
    }

    async fn insert_trade(&self, trade: &NewTrade) -> anyhow::Result<Trade> {
        let mut tables = self.tables.lock().await;

        if trade.status != TradeStatus::Closed
            && tables.trades.iter().any(|t| {
                t.status() != TradeStatus::Closed
                    && t.buy_token_address
                        .eq_ignore_ascii_case(&trade.buy_token_address)
            })
        {
            anyhow::bail!(
                "duplicate non-closed trade for token {}",
                trade.buy_token_address
            );
        }

        let now = Utc::now();
        let row = Trade {
            id: Uuid::new_v4(),
            chain: trade.chain.clone(),
            watched_address: trade.watched_address.clone(),
            wallet_address: trade.wallet_address.clone(),
            follow_buy_tx_hash: trade.follow_buy_tx_hash.clone(),
            follow_buy_time: trade.follow_buy_time,
            buy_token_address: trade.buy_token_address.clone(),
            buy_symbol: trade.buy_symbol.clone(),
            buy_token_decimals: trade.buy_token_decimals,
            follow_buy_amount: trade.follow_buy_amount,
            wallet_buy_tx_hash: trade.wallet_buy_tx_hash.clone(),
            wallet_buy_time: trade.wallet_buy_time,
            wallet_buy_amount: trade.wallet_buy_amount,
            wallet_exit_amount: trade.wallet_exit_amount,
            gas_cost: trade.gas_cost,
            principal_sold: false,
            principal_sold_tx_hash: None,
            status: trade.status.as_str().to_string(),
            failure_reason: trade.failure_reason.clone(),
            created_at: Some(now),
            updated_at: Some(now),
        };
        tables.trades.push(row.clone());
        Ok(row)
    }

    async fn find_unclosed_trade_by_token(&self, token: &str) -> anyhow::Result<Option<Trade>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .trades
            .iter()
            .find(|t| {
                t.status() != TradeStatus::Closed && t.buy_token_address.eq_ignore_ascii_case(token)
            })
            .cloned())
    }

    async fn open_trades(&self) -> anyhow::Result<Vec<Trade>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .trades
            .iter()
            .filter(|t| t.status() == TradeStatus::Open)
            .cloned()
            .collect())
    }

    async fn open_trades_pending_exit(&self) -> anyhow::Result<Vec<Trade>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .trades
            .iter()
            .filter(|t| t.status() == TradeStatus::Open && !t.principal_sold)
            .cloned()
            .collect())
    }

    async fn mark_principal_sold(&self, id: Uuid, tx_hash: &str) -> anyhow::Result<()> {
        let mut tables = self.tables.lock().await;
        if let Some(t) = tables
            .trades
            .iter_mut()
            .find(|t| t.id == id && t.status() == TradeStatus::Open)
        {
            t.principal_sold = true;
            t.principal_sold_tx_hash = Some(tx_hash.to_string());
            t.updated_at = Some(Utc::now());
        }
        Ok(())
    }

    async fn close_trade(&self, id: Uuid) -> anyhow::Result<()> {
        let mut tables = self.tables.lock().await;
        if let Some(t) = tables
            .trades
            .iter_mut()
            .find(|t| t.id == id && t.status() == TradeStatus::Open)
        {
            t.status = TradeStatus::Closed.as_str().to_string();
            t.updated_at = Some(Utc::now());
        }
        Ok(())
    }

    async fn list_trades(
        &self,
        page: i64,
        page_size: i64,
        status: Option<TradeStatus>,
    ) -> anyhow::Result<(Vec<Trade>, i64)> {
        let tables = self.tables.lock().await;
        let matching: Vec<&Trade> = tables
            .trades
            .iter()
            .rev()
            .filter(|t| status.map_or(true, |s| t.status() == s))
            .collect();

        let total = matching.len() as i64;
        let skip = page
            .saturating_sub(1)
            .max(0)
            .saturating_mul(page_size.max(0)) as usize;
        let trades = matching
            .into_iter()
            .skip(skip)
            .take(page_size.max(0) as usize)
            .cloned()
            .collect();

        Ok((trades, total))
    }

    async fn get_trade(&self, id: Uuid) -> anyhow::Result<Option<Trade>> {
        let tables = self.tables.lock().await;
        Ok(tables.trades.iter().find(|t| t.id == id).cloned())
    }

    async fn ping(&self) -> anyhow::Result<()> {
        Ok(())
    }
}
