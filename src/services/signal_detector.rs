use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use metrics::counter;
use rust_decimal::Decimal;

use crate::config::PipelineConfig;
use crate::db::DomainStore;
use crate::errors::PipelineError;
use crate::execution::TradeExecutor;
use crate::gateway::MarketGateway;
use crate::intelligence::{classify_legs, SwapClassification};
use crate::models::{normalize_address, BuySignal, ManagedWallet, TradeStatus, WatchedAddress};

use super::pass_guard::PassGuard;
use super::scheduler::PeriodicPass;

/// What happened to one watched address during a detection pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressOutcome {
    /// Latest transaction already evaluated, or the address has none.
    NoNewTransaction,
    /// New transaction that is not a qualifying buy.
    Ignored(&'static str),
    /// Qualifying buy for a token that already has a non-closed trade.
    Duplicate,
    /// A trade was recorded with this status.
    Traded(TradeStatus),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DetectionSummary {
    pub addresses: usize,
    pub new_transactions: usize,
    pub signals: usize,
    pub trades_opened: usize,
    pub trades_failed: usize,
    pub errors: usize,
}

/// Walks every enabled watched address, turns fresh qualifying buys into
/// trades.
pub struct SignalDetector {
    gateway: Arc<dyn MarketGateway>,
    store: Arc<dyn DomainStore>,
    executor: TradeExecutor,
    config: Arc<PipelineConfig>,
    guard: PassGuard,
}

impl SignalDetector {
    pub fn new(
        gateway: Arc<dyn MarketGateway>,
        store: Arc<dyn DomainStore>,
        executor: TradeExecutor,
        config: Arc<PipelineConfig>,
    ) -> Self {
        Self {
            gateway,
            store,
            executor,
            config,
            guard: PassGuard::new("detect"),
        }
    }

    /// One detection pass. Returns `Ok(None)` when a previous pass is still
    /// running.
    ///
    /// Addresses are processed one at a time. A failure on one address is
    /// logged and the pass moves on; only a missing wallet pool aborts it.
    pub async fn run_pass(&self) -> Result<Option<DetectionSummary>, PipelineError> {
        let Some(_pass) = self.guard.try_enter() else {
            return Ok(None);
        };

        let wallets = self.store.enabled_wallets().await?;
        if wallets.is_empty() {
            return Err(PipelineError::Configuration(
                "no enabled managed wallets".into(),
            ));
        }

        let addresses = self.store.enabled_watched_addresses().await?;
        let mut summary = DetectionSummary {
            addresses: addresses.len(),
            ..Default::default()
        };

        for address in &addresses {
            if !wallets.iter().any(|w| w.chain == address.chain) {
                tracing::warn!(
                    chain = %address.chain,
                    address = %address.address,
                    "No enabled wallet on chain, skipping address"
                );
                continue;
            }

            match self.process_address(address, &wallets).await {
                Ok(outcome) => {
                    if outcome != AddressOutcome::NoNewTransaction {
                        summary.new_transactions += 1;
                    }
                    match outcome {
                        AddressOutcome::Duplicate => summary.signals += 1,
                        AddressOutcome::Traded(TradeStatus::Open) => {
                            summary.signals += 1;
                            summary.trades_opened += 1;
                        }
                        AddressOutcome::Traded(_) => {
                            summary.signals += 1;
                            summary.trades_failed += 1;
                        }
                        _ => {}
                    }
                }
                Err(e) => {
                    summary.errors += 1;
                    if e.is_transient() {
                        tracing::warn!(
                            address = %address.address,
                            error = %e,
                            "Address lookup failed, will retry next pass"
                        );
                    } else {
                        tracing::error!(
                            address = %address.address,
                            error = %e,
                            "Address processing failed"
                        );
                    }
                }
            }
        }

        Ok(Some(summary))
    }

    /// Evaluate the latest transaction of one address.
    pub async fn process_address(
        &self,
        address: &WatchedAddress,
        wallets: &[ManagedWallet],
    ) -> Result<AddressOutcome, PipelineError> {
        let chain = address.chain.as_str();

        let Some(latest) = self
            .gateway
            .latest_transaction(chain, &address.address)
            .await?
        else {
            return Ok(AddressOutcome::NoNewTransaction);
        };

        if address.has_seen(&latest.tx_hash) {
            tracing::debug!(address = %address.address, tx_hash = %latest.tx_hash, "No new transaction");
            return Ok(AddressOutcome::NoNewTransaction);
        }

        let legs = self
            .gateway
            .transaction_legs(chain, &latest.tx_hash)
            .await?;

        // From here on this transaction is never evaluated again.
        self.store
            .advance_last_seen(address.id, &latest.tx_hash, latest.timestamp)
            .await?;

        let verdict = classify_legs(&legs, |symbol| self.config.is_reference_symbol(symbol));
        let bought = match verdict {
            SwapClassification::Buy { bought } => bought,
            SwapClassification::NoLegs => {
                counter!("signals_ignored_total", "reason" => "no_legs").increment(1);
                tracing::warn!(
                    address = %address.address,
                    tx_hash = %latest.tx_hash,
                    "Transaction has no transfer legs"
                );
                return Ok(AddressOutcome::Ignored("no_legs"));
            }
            other => {
                counter!("signals_ignored_total", "reason" => other.as_str()).increment(1);
                tracing::debug!(
                    address = %address.address,
                    tx_hash = %latest.tx_hash,
                    verdict = %other,
                    "Transaction ignored"
                );
                return Ok(AddressOutcome::Ignored(other.as_str()));
            }
        };

        let token_address = normalize_address(&bought.token_address);
        if token_address.is_empty() {
            return Err(PipelineError::Validation(format!(
                "bought leg of {} has no token address",
                latest.tx_hash
            )));
        }

        let signal = BuySignal {
            chain: address.chain.clone(),
            watched_address: address.address.clone(),
            tx_hash: latest.tx_hash.clone(),
            tx_time: latest.timestamp,
            token_address,
            symbol: bought.symbol.clone(),
            amount: parse_amount(&bought.amount)?,
        };

        counter!("signals_detected_total").increment(1);
        tracing::info!(
            chain = %signal.chain,
            address = %signal.watched_address,
            tx_hash = %signal.tx_hash,
            token = %signal.token_address,
            symbol = %signal.symbol,
            amount = %signal.amount,
            "Buy signal detected"
        );

        if let Some(existing) = self
            .store
            .find_unclosed_trade_by_token(&signal.token_address)
            .await?
        {
            tracing::info!(
                token = %signal.token_address,
                existing_trade = %existing.id,
                existing_status = %existing.status,
                "Token already has an unclosed trade, not following"
            );
            return Ok(AddressOutcome::Duplicate);
        }

        let trade = self.executor.execute(&signal, wallets).await?;
        Ok(AddressOutcome::Traded(trade.status()))
    }
}

#[async_trait]
impl PeriodicPass for SignalDetector {
    fn name(&self) -> &'static str {
        self.guard.name()
    }

    async fn tick(&self) {
        match self.run_pass().await {
            Ok(Some(summary)) => tracing::info!(
                addresses = summary.addresses,
                new_transactions = summary.new_transactions,
                signals = summary.signals,
                opened = summary.trades_opened,
                failed = summary.trades_failed,
                errors = summary.errors,
                "Detection pass complete"
            ),
            Ok(None) => {}
            Err(e) => tracing::error!(error = %e, "Detection pass aborted"),
        }
    }
}

/// Explorer amounts are plain decimals, occasionally in scientific notation.
fn parse_amount(raw: &str) -> Result<Decimal, PipelineError> {
    let raw = raw.trim();
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .map_err(|e| PipelineError::Validation(format!("buy amount {raw:?}: {e}")))
}
