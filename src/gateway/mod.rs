pub mod aggregator;
pub mod chain_client;
pub mod explorer;
pub mod http;
pub mod retry;
pub mod types;

pub use aggregator::AggregatorClient;
pub use chain_client::ChainClient;
pub use explorer::ExplorerClient;
pub use http::HttpGateway;
pub use retry::RetryPolicy;
pub use types::{Quote, SwapParams, TransferLeg, TxReceipt, TxSummary, UnsignedTx};

use std::time::Duration;

use alloy::primitives::U256;
use async_trait::async_trait;
use rust_decimal::Decimal;
use secrecy::SecretString;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    /// Network failure, timeout, rate limit or 5xx. Safe to retry.
    #[error("transient: {0}")]
    Transient(String),

    /// The upstream answered but the payload could not be understood.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The upstream refused the request (no route, reverted, bad nonce...).
    #[error("rejected: {0}")]
    Rejected(String),

    #[error("timed out waiting for receipt of {tx_hash} after {attempts} attempts")]
    ReceiptTimeout { tx_hash: String, attempts: u32 },

    /// The chain or operation is not configured on this gateway.
    #[error("unsupported: {0}")]
    Unsupported(String),
}

impl GatewayError {
    pub fn is_transient(&self) -> bool {
        matches!(self, GatewayError::Transient(_))
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() || e.is_connect() || e.is_request() {
            return GatewayError::Transient(e.to_string());
        }
        match e.status() {
            Some(status) if status.as_u16() == 429 || status.is_server_error() => {
                GatewayError::Transient(e.to_string())
            }
            Some(_) => GatewayError::Rejected(e.to_string()),
            None if e.is_decode() => GatewayError::InvalidResponse(e.to_string()),
            None => GatewayError::Transient(e.to_string()),
        }
    }
}

/// Everything the pipeline needs from the outside world: chain explorer
/// lookups, aggregator quotes/routes and transaction submission.
///
/// Implementations retry transient failures themselves; callers treat a
/// returned `Transient` as "give up for this pass".
#[async_trait]
pub trait MarketGateway: Send + Sync {
    /// Most recent token transfer transaction involving `address`.
    async fn latest_transaction(
        &self,
        chain: &str,
        address: &str,
    ) -> Result<Option<TxSummary>, GatewayError>;

    /// Ordered token transfer legs of a transaction.
    async fn transaction_legs(
        &self,
        chain: &str,
        tx_hash: &str,
    ) -> Result<Vec<TransferLeg>, GatewayError>;

    /// Human-unit holding of `token` by `address`; `None` when not held.
    async fn token_balance(
        &self,
        chain: &str,
        address: &str,
        token: &str,
    ) -> Result<Option<Decimal>, GatewayError>;

    async fn quote(
        &self,
        chain: &str,
        from_token: &str,
        to_token: &str,
        amount: U256,
    ) -> Result<Quote, GatewayError>;

    async fn build_swap(&self, chain: &str, params: &SwapParams)
        -> Result<UnsignedTx, GatewayError>;

    /// Router allowance granted by `owner` for `token`, in base units.
    async fn allowance(&self, chain: &str, token: &str, owner: &str)
        -> Result<U256, GatewayError>;

    /// Approval for the router to spend `token`; `None` approves without limit.
    async fn build_approval(
        &self,
        chain: &str,
        token: &str,
        owner: &str,
        amount: Option<U256>,
    ) -> Result<UnsignedTx, GatewayError>;

    /// Sign and broadcast. Never retried.
    async fn submit(
        &self,
        chain: &str,
        secret_key: &SecretString,
        tx: &UnsignedTx,
    ) -> Result<String, GatewayError>;

    /// Poll for a receipt up to `max_attempts` times, `interval` apart.
    async fn wait_receipt(
        &self,
        chain: &str,
        tx_hash: &str,
        max_attempts: u32,
        interval: Duration,
    ) -> Result<TxReceipt, GatewayError>;

    async fn token_decimals(&self, chain: &str, token: &str) -> Result<u8, GatewayError>;

    /// Current gas price in wei.
    async fn gas_price(&self, chain: &str) -> Result<u128, GatewayError>;
}
