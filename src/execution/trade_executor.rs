use std::sync::Arc;

use metrics::counter;
use rust_decimal::Decimal;

use crate::config::{ChainConfig, PipelineConfig};
use crate::db::DomainStore;
use crate::errors::PipelineError;
use crate::gateway::MarketGateway;
use crate::models::{BuySignal, ManagedWallet, NewTrade, Trade, TradeStatus};

use super::swap::{ApprovalRule, SwapOrder, SwapRunner};
use super::units::{from_base_units, to_base_units};
use super::wallet_selector::select_wallet;

/// Mirrors a buy signal from one managed wallet and records the result.
///
/// Exactly one trade row is written per call that gets past wallet
/// selection, whether the swap succeeded (`Open`) or not (`Failed`).
#[derive(Clone)]
pub struct TradeExecutor {
    gateway: Arc<dyn MarketGateway>,
    store: Arc<dyn DomainStore>,
    swaps: SwapRunner,
    config: Arc<PipelineConfig>,
}

impl TradeExecutor {
    pub fn new(
        gateway: Arc<dyn MarketGateway>,
        store: Arc<dyn DomainStore>,
        swaps: SwapRunner,
        config: Arc<PipelineConfig>,
    ) -> Self {
        Self {
            gateway,
            store,
            swaps,
            config,
        }
    }

    /// Execute `signal` from a wallet drawn out of `wallets`.
    ///
    /// Errors before a wallet is chosen (no wallet on the chain, unknown
    /// chain) are returned without writing anything. Store failures are
    /// returned as-is. Every other failure ends up in the returned trade's
    /// `failure_reason`.
    pub async fn execute(
        &self,
        signal: &BuySignal,
        wallets: &[ManagedWallet],
    ) -> Result<Trade, PipelineError> {
        let chain = self.config.chain(&signal.chain).ok_or_else(|| {
            PipelineError::Configuration(format!("unknown chain {:?}", signal.chain))
        })?;

        let wallet = {
            let mut rng = rand::thread_rng();
            select_wallet(wallets, &signal.chain, &mut rng)
        }
        .ok_or_else(|| {
            PipelineError::Configuration(format!("no enabled wallet on {}", signal.chain))
        })?;

        tracing::info!(
            chain = %signal.chain,
            watched = %signal.watched_address,
            wallet = %wallet.address,
            token = %signal.token_address,
            symbol = %signal.symbol,
            spend = %wallet.fixed_exit_amount,
            "Executing copy buy"
        );

        let mut record = NewTrade {
            chain: signal.chain.clone(),
            watched_address: signal.watched_address.clone(),
            wallet_address: wallet.address.clone(),
            follow_buy_tx_hash: signal.tx_hash.clone(),
            follow_buy_time: signal.tx_time,
            buy_token_address: signal.token_address.clone(),
            buy_symbol: signal.symbol.clone(),
            buy_token_decimals: 0,
            follow_buy_amount: signal.amount,
            wallet_buy_tx_hash: None,
            wallet_buy_time: None,
            wallet_buy_amount: Decimal::ZERO,
            wallet_exit_amount: wallet.fixed_exit_amount,
            gas_cost: Decimal::ZERO,
            status: TradeStatus::Open,
            failure_reason: None,
        };

        if let Err(e) = self.buy(&mut record, chain, wallet).await {
            tracing::error!(
                chain = %signal.chain,
                wallet = %wallet.address,
                token = %signal.token_address,
                error = %e,
                "Copy buy failed"
            );
            record = record.fail(e.to_string());
        }

        let trade = match self.store.insert_trade(&record).await {
            Ok(trade) => trade,
            Err(e) => {
                // The swap may already be on-chain; leave enough to reconcile by hand.
                tracing::error!(
                    chain = %record.chain,
                    wallet = %record.wallet_address,
                    token = %record.buy_token_address,
                    follow_tx = %record.follow_buy_tx_hash,
                    tx_hash = record.wallet_buy_tx_hash.as_deref().unwrap_or_default(),
                    status = record.status.as_str(),
                    bought = %record.wallet_buy_amount,
                    error = %e,
                    "Trade not recorded"
                );
                return Err(e.into());
            }
        };

        match trade.status() {
            TradeStatus::Open => {
                counter!("trades_opened_total").increment(1);
                tracing::info!(
                    trade_id = %trade.id,
                    tx_hash = trade.wallet_buy_tx_hash.as_deref().unwrap_or_default(),
                    bought = %trade.wallet_buy_amount,
                    gas_cost = %trade.gas_cost,
                    "Trade opened"
                );
            }
            _ => counter!("trades_failed_total").increment(1),
        }

        Ok(trade)
    }

    async fn buy(
        &self,
        record: &mut NewTrade,
        chain: &ChainConfig,
        wallet: &ManagedWallet,
    ) -> Result<(), PipelineError> {
        let native = &chain.native_token;
        let spend = to_base_units(wallet.fixed_exit_amount, native.decimals)?;

        let quote = self
            .gateway
            .quote(&chain.name, &native.address, &record.buy_token_address, spend)
            .await?;
        record.buy_token_decimals = i32::from(quote.to_token_decimals);
        record.wallet_buy_amount = from_base_units(quote.to_amount, quote.to_token_decimals)?;

        let outcome = self
            .swaps
            .execute(SwapOrder {
                chain: &chain.name,
                wallet,
                from_token: &native.address,
                to_token: &record.buy_token_address,
                amount: spend,
                approval: ApprovalRule::WhenZero,
            })
            .await?;

        record.wallet_buy_tx_hash = Some(outcome.tx_hash);
        record.wallet_buy_time = Some(outcome.submitted_at);
        record.gas_cost = from_base_units(outcome.receipt.fee(), native.decimals)?;
        Ok(())
    }
}
