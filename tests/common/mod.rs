use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use alloy::primitives::U256;
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use secrecy::SecretString;

use smartmoney::config::{PipelineConfig, ReceiptPolicy};
use smartmoney::db::{DomainStore, MemoryStore};
use smartmoney::execution::{SubmissionQueue, SwapRunner, TradeExecutor};
use smartmoney::gateway::{
    GatewayError, MarketGateway, Quote, SwapParams, TransferLeg, TxReceipt, TxSummary,
    UnsignedTx,
};
use smartmoney::models::{ManagedWallet, NewTrade, TradeStatus};
use smartmoney::services::{PositionCloseMonitor, ProfitExitMonitor, SignalDetector};

#[allow(dead_code)]
pub const ETH_NATIVE: &str = "0xeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeee";
#[allow(dead_code)]
pub const ETH_USDC: &str = "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48";
#[allow(dead_code)]
pub const WETH: &str = "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2";
#[allow(dead_code)]
pub const PEPE: &str = "0x6982508145454ce325ddbe47a25d4ec3d2311933";
#[allow(dead_code)]
pub const SHIB: &str = "0x95ad61b0a150d79219dcf64e1e6cc01f0b64c4ce";

/// `n * 10^decimals` as a base-unit integer.
#[allow(dead_code)]
pub fn units(n: u64, decimals: u8) -> U256 {
    U256::from(n) * U256::from(10u8).pow(U256::from(decimals))
}

#[allow(dead_code)]
pub fn ts(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).unwrap()
}

#[allow(dead_code)]
pub fn leg(symbol: &str, token: &str, amount: &str) -> TransferLeg {
    TransferLeg {
        from: "0xpool".into(),
        to: "0xwatched".into(),
        token_address: token.into(),
        symbol: symbol.into(),
        token_id: String::new(),
        amount: amount.into(),
    }
}

#[allow(dead_code)]
pub fn wallet(chain: &str, address: &str, fixed_exit_amount: Decimal) -> ManagedWallet {
    ManagedWallet::new(
        chain,
        address,
        SecretString::from("11".repeat(32)),
        fixed_exit_amount,
    )
}

/// Pipeline settings with instant receipt polling.
#[allow(dead_code)]
pub fn pipeline_config() -> PipelineConfig {
    PipelineConfig {
        receipt: ReceiptPolicy {
            max_attempts: 1,
            interval: Duration::from_millis(0),
        },
        ..PipelineConfig::default()
    }
}

/// An open trade on `token` ready to be inserted.
#[allow(dead_code)]
pub fn open_trade(token: &str, wallet_address: &str) -> NewTrade {
    NewTrade {
        chain: "eth".into(),
        watched_address: "0xwatched".into(),
        wallet_address: wallet_address.into(),
        follow_buy_tx_hash: "0xfollow".into(),
        follow_buy_time: ts(1_700_000_000),
        buy_token_address: token.into(),
        buy_symbol: "PEPE".into(),
        buy_token_decimals: 18,
        follow_buy_amount: Decimal::from(5_000),
        wallet_buy_tx_hash: Some("0xbuy".into()),
        wallet_buy_time: Some(ts(1_700_000_060)),
        wallet_buy_amount: Decimal::from(1_000),
        wallet_exit_amount: Decimal::ONE,
        gas_cost: Decimal::ZERO,
        status: TradeStatus::Open,
        failure_reason: None,
    }
}

#[derive(Default)]
struct FakeState {
    latest: HashMap<String, TxSummary>,
    legs: HashMap<String, Vec<TransferLeg>>,
    balances: HashMap<(String, String), Decimal>,
    quotes: HashMap<(String, String), Quote>,
    decimals: HashMap<String, u8>,
    allowance: U256,
    gas_price: u128,
    receipt: Option<TxReceipt>,
    latest_error: bool,
    submit_error: bool,

    latest_calls: usize,
    legs_calls: usize,
    balance_calls: usize,
    quote_calls: Vec<(String, String, U256)>,
    approvals_built: usize,
    swaps_built: Vec<SwapParams>,
    submitted: Vec<UnsignedTx>,
}

/// Scriptable in-memory [`MarketGateway`]. Unscripted quotes fail as
/// "no route"; receipts succeed with 21000 gas at 10 gwei unless overridden.
#[derive(Default)]
#[allow(dead_code)]
pub struct FakeGateway {
    state: Mutex<FakeState>,
}

#[allow(dead_code)]
impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_latest(&self, address: &str, tx_hash: &str, at: DateTime<Utc>) {
        self.state.lock().unwrap().latest.insert(
            address.to_ascii_lowercase(),
            TxSummary {
                tx_hash: tx_hash.into(),
                timestamp: at,
            },
        );
    }

    pub fn set_legs(&self, tx_hash: &str, legs: Vec<TransferLeg>) {
        self.state.lock().unwrap().legs.insert(tx_hash.into(), legs);
    }

    pub fn set_quote(&self, from: &str, to: &str, to_amount: U256, to_decimals: u8, gas: u64) {
        self.state.lock().unwrap().quotes.insert(
            (from.to_ascii_lowercase(), to.to_ascii_lowercase()),
            Quote {
                to_amount,
                to_token_decimals: to_decimals,
                estimated_gas: gas,
            },
        );
    }

    pub fn set_balance(&self, wallet: &str, token: &str, amount: Decimal) {
        self.state
            .lock()
            .unwrap()
            .balances
            .insert((wallet.to_ascii_lowercase(), token.to_ascii_lowercase()), amount);
    }

    pub fn set_decimals(&self, token: &str, decimals: u8) {
        self.state
            .lock()
            .unwrap()
            .decimals
            .insert(token.to_ascii_lowercase(), decimals);
    }

    pub fn set_allowance(&self, allowance: U256) {
        self.state.lock().unwrap().allowance = allowance;
    }

    pub fn set_gas_price(&self, wei: u128) {
        self.state.lock().unwrap().gas_price = wei;
    }

    pub fn set_receipt(&self, receipt: TxReceipt) {
        self.state.lock().unwrap().receipt = Some(receipt);
    }

    pub fn fail_latest(&self, fail: bool) {
        self.state.lock().unwrap().latest_error = fail;
    }

    pub fn fail_submit(&self, fail: bool) {
        self.state.lock().unwrap().submit_error = fail;
    }

    pub fn latest_calls(&self) -> usize {
        self.state.lock().unwrap().latest_calls
    }

    pub fn legs_calls(&self) -> usize {
        self.state.lock().unwrap().legs_calls
    }

    pub fn balance_calls(&self) -> usize {
        self.state.lock().unwrap().balance_calls
    }

    pub fn quote_calls(&self) -> Vec<(String, String, U256)> {
        self.state.lock().unwrap().quote_calls.clone()
    }

    pub fn approvals_built(&self) -> usize {
        self.state.lock().unwrap().approvals_built
    }

    pub fn swaps_built(&self) -> Vec<SwapParams> {
        self.state.lock().unwrap().swaps_built.clone()
    }

    pub fn submitted(&self) -> Vec<UnsignedTx> {
        self.state.lock().unwrap().submitted.clone()
    }
}

#[async_trait]
impl MarketGateway for FakeGateway {
    async fn latest_transaction(
        &self,
        _chain: &str,
        address: &str,
    ) -> Result<Option<TxSummary>, GatewayError> {
        let mut state = self.state.lock().unwrap();
        state.latest_calls += 1;
        if state.latest_error {
            return Err(GatewayError::Transient("rate limited".into()));
        }
        Ok(state.latest.get(&address.to_ascii_lowercase()).cloned())
    }

    async fn transaction_legs(
        &self,
        _chain: &str,
        tx_hash: &str,
    ) -> Result<Vec<TransferLeg>, GatewayError> {
        let mut state = self.state.lock().unwrap();
        state.legs_calls += 1;
        Ok(state.legs.get(tx_hash).cloned().unwrap_or_default())
    }

    async fn token_balance(
        &self,
        _chain: &str,
        address: &str,
        token: &str,
    ) -> Result<Option<Decimal>, GatewayError> {
        let mut state = self.state.lock().unwrap();
        state.balance_calls += 1;
        Ok(state
            .balances
            .get(&(address.to_ascii_lowercase(), token.to_ascii_lowercase()))
            .copied())
    }

    async fn quote(
        &self,
        _chain: &str,
        from_token: &str,
        to_token: &str,
        amount: U256,
    ) -> Result<Quote, GatewayError> {
        let mut state = self.state.lock().unwrap();
        state
            .quote_calls
            .push((from_token.to_ascii_lowercase(), to_token.to_ascii_lowercase(), amount));
        state
            .quotes
            .get(&(from_token.to_ascii_lowercase(), to_token.to_ascii_lowercase()))
            .cloned()
            .ok_or_else(|| GatewayError::Rejected("no route".into()))
    }

    async fn build_swap(
        &self,
        _chain: &str,
        params: &SwapParams,
    ) -> Result<UnsignedTx, GatewayError> {
        let mut state = self.state.lock().unwrap();
        state.swaps_built.push(params.clone());
        Ok(UnsignedTx {
            from: params.from_address.clone(),
            to: "0x1111111254fb6c44bac0bed2854e76f90643097d".into(),
            data: format!("swap:{}:{}", params.from_token, params.to_token),
            value: params.amount,
            gas_price: 10_000_000_000,
            gas_limit: None,
        })
    }

    async fn allowance(
        &self,
        _chain: &str,
        _token: &str,
        _owner: &str,
    ) -> Result<U256, GatewayError> {
        Ok(self.state.lock().unwrap().allowance)
    }

    async fn build_approval(
        &self,
        _chain: &str,
        token: &str,
        owner: &str,
        _amount: Option<U256>,
    ) -> Result<UnsignedTx, GatewayError> {
        let mut state = self.state.lock().unwrap();
        state.approvals_built += 1;
        Ok(UnsignedTx {
            from: owner.into(),
            to: token.into(),
            data: format!("approve:{token}"),
            value: U256::ZERO,
            gas_price: 10_000_000_000,
            gas_limit: None,
        })
    }

    async fn submit(
        &self,
        _chain: &str,
        _secret_key: &SecretString,
        tx: &UnsignedTx,
    ) -> Result<String, GatewayError> {
        let mut state = self.state.lock().unwrap();
        if state.submit_error {
            return Err(GatewayError::Rejected("nonce too low".into()));
        }
        state.submitted.push(tx.clone());
        Ok(format!("0xsubmitted{}", state.submitted.len()))
    }

    async fn wait_receipt(
        &self,
        _chain: &str,
        _tx_hash: &str,
        _max_attempts: u32,
        _interval: Duration,
    ) -> Result<TxReceipt, GatewayError> {
        Ok(self.state.lock().unwrap().receipt.unwrap_or(TxReceipt {
            success: true,
            gas_used: 21_000,
            effective_gas_price: 10_000_000_000,
        }))
    }

    async fn token_decimals(&self, _chain: &str, token: &str) -> Result<u8, GatewayError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .decimals
            .get(&token.to_ascii_lowercase())
            .copied()
            .unwrap_or(18))
    }

    async fn gas_price(&self, _chain: &str) -> Result<u128, GatewayError> {
        Ok(self.state.lock().unwrap().gas_price)
    }
}

/// All three passes wired over one memory store and one fake gateway.
#[allow(dead_code)]
pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub gateway: Arc<FakeGateway>,
    pub executor: TradeExecutor,
    pub detector: SignalDetector,
    pub profit_exit: ProfitExitMonitor,
    pub position_close: PositionCloseMonitor,
}

#[allow(dead_code)]
pub fn harness() -> Harness {
    let store = Arc::new(MemoryStore::new());
    let gateway = Arc::new(FakeGateway::new());
    let config = Arc::new(pipeline_config());

    let dyn_store: Arc<dyn DomainStore> = store.clone();
    let dyn_gateway: Arc<dyn MarketGateway> = gateway.clone();

    let swaps = SwapRunner::new(dyn_gateway.clone(), SubmissionQueue::new(), config.clone());
    let executor = TradeExecutor::new(
        dyn_gateway.clone(),
        dyn_store.clone(),
        swaps.clone(),
        config.clone(),
    );

    Harness {
        executor: executor.clone(),
        detector: SignalDetector::new(
            dyn_gateway.clone(),
            dyn_store.clone(),
            executor,
            config.clone(),
        ),
        profit_exit: ProfitExitMonitor::new(
            dyn_gateway.clone(),
            dyn_store.clone(),
            swaps,
            config.clone(),
        ),
        position_close: PositionCloseMonitor::new(dyn_gateway, dyn_store, config),
        store,
        gateway,
    }
}

/// Postgres pool for the `#[ignore]`d store tests, with the schema applied
/// and every table emptied. `None` when `TEST_DATABASE_URL` is unset.
#[allow(dead_code)]
pub async fn test_pool() -> Option<sqlx::PgPool> {
    let url = std::env::var("TEST_DATABASE_URL").ok()?;
    let pool = smartmoney::db::init_pool(&url)
        .await
        .expect("connect to TEST_DATABASE_URL");
    sqlx::query("TRUNCATE trades, managed_wallets, watched_addresses")
        .execute(&pool)
        .await
        .expect("truncate tables");
    Some(pool)
}
