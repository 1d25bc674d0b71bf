use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Lifecycle state of a mirrored trade.
///
/// `Failed` and `Closed` are terminal. `principal_sold` flips independently
/// while a trade stays `Open`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeStatus {
    Open,
    Failed,
    Closed,
}

impl TradeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeStatus::Open => "open",
            TradeStatus::Failed => "failed",
            TradeStatus::Closed => "closed",
        }
    }
}

impl fmt::Display for TradeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TradeStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "open" => Ok(TradeStatus::Open),
            "failed" => Ok(TradeStatus::Failed),
            "closed" => Ok(TradeStatus::Closed),
            other => Err(format!("unknown trade status: {other}")),
        }
    }
}

/// Database row for trades table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Trade {
    pub id: Uuid,
    pub chain: String,
    pub watched_address: String,
    pub wallet_address: String,
    pub follow_buy_tx_hash: String,
    pub follow_buy_time: DateTime<Utc>,
    pub buy_token_address: String,
    pub buy_symbol: String,
    pub buy_token_decimals: i32,
    pub follow_buy_amount: Decimal,
    pub wallet_buy_tx_hash: Option<String>,
    pub wallet_buy_time: Option<DateTime<Utc>>,
    pub wallet_buy_amount: Decimal,
    /// Native-token units committed to the buy.
    pub wallet_exit_amount: Decimal,
    /// Native-token units spent on gas for the buy.
    pub gas_cost: Decimal,
    pub principal_sold: bool,
    pub principal_sold_tx_hash: Option<String>,
    pub status: String,
    pub failure_reason: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Trade {
    /// Parsed status. Unknown values read as `Failed` so they are never
    /// picked up by the position monitors.
    pub fn status(&self) -> TradeStatus {
        self.status.parse().unwrap_or(TradeStatus::Failed)
    }

    /// Native units spent acquiring the position: committed amount plus buy gas.
    pub fn cost_basis(&self) -> Decimal {
        self.wallet_exit_amount + self.gas_cost
    }
}

/// Everything needed to insert a trade row. Built up by the trade executor
/// as execution progresses so a failure at any step still leaves an
/// auditable record.
#[derive(Debug, Clone)]
pub struct NewTrade {
    pub chain: String,
    pub watched_address: String,
    pub wallet_address: String,
    pub follow_buy_tx_hash: String,
    pub follow_buy_time: DateTime<Utc>,
    pub buy_token_address: String,
    pub buy_symbol: String,
    pub buy_token_decimals: i32,
    pub follow_buy_amount: Decimal,
    pub wallet_buy_tx_hash: Option<String>,
    pub wallet_buy_time: Option<DateTime<Utc>>,
    pub wallet_buy_amount: Decimal,
    pub wallet_exit_amount: Decimal,
    pub gas_cost: Decimal,
    pub status: TradeStatus,
    pub failure_reason: Option<String>,
}

impl NewTrade {
    /// Mark this record as failed with a human-readable reason.
    pub fn fail(mut self, reason: impl Into<String>) -> Self {
        self.status = TradeStatus::Failed;
        self.failure_reason = Some(reason.into());
        self
    }
}
