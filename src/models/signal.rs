use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// A qualifying buy detected on a watched address, ready for execution.
#[derive(Debug, Clone)]
pub struct BuySignal {
    pub chain: String,
    /// The watched address that made the buy.
    pub watched_address: String,
    pub tx_hash: String,
    pub tx_time: DateTime<Utc>,
    /// Contract address of the acquired token (lowercased).
    pub token_address: String,
    pub symbol: String,
    /// Amount of the token the watched address received.
    pub amount: Decimal,
}
