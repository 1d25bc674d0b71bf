use alloy::primitives::U256;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The most recent token transfer transaction seen for an address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxSummary {
    pub tx_hash: String,
    pub timestamp: DateTime<Utc>,
}

/// One token transfer inside a transaction, in log order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferLeg {
    pub from: String,
    pub to: String,
    pub token_address: String,
    pub symbol: String,
    /// Non-empty for NFT transfers.
    pub token_id: String,
    /// Human-unit amount as reported by the explorer.
    pub amount: String,
}

/// Aggregator quote for swapping `amount` of one token into another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quote {
    /// Output amount in the destination token's base units.
    pub to_amount: U256,
    pub to_token_decimals: u8,
    pub estimated_gas: u64,
}

/// Parameters for building a swap through the aggregator router.
#[derive(Debug, Clone)]
pub struct SwapParams {
    pub from_token: String,
    pub to_token: String,
    /// Input amount in the source token's base units.
    pub amount: U256,
    pub from_address: String,
    pub slippage_pct: Decimal,
}

/// A transaction ready to be signed and submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedTx {
    pub from: String,
    pub to: String,
    /// Hex-encoded calldata.
    pub data: String,
    pub value: U256,
    pub gas_price: u128,
    pub gas_limit: Option<u64>,
}

/// Mined transaction outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxReceipt {
    pub success: bool,
    pub gas_used: u64,
    pub effective_gas_price: u128,
}

impl TxReceipt {
    /// Total fee paid, in native base units.
    pub fn fee(&self) -> U256 {
        U256::from(self.effective_gas_price) * U256::from(self.gas_used)
    }
}
