use std::sync::Arc;

use alloy::primitives::U256;
use async_trait::async_trait;
use metrics::counter;
use rust_decimal::Decimal;

use crate::config::PipelineConfig;
use crate::db::DomainStore;
use crate::errors::PipelineError;
use crate::execution::{from_base_units, to_base_units, ApprovalRule, SwapOrder, SwapRunner};
use crate::gateway::MarketGateway;
use crate::models::Trade;

use super::pass_guard::PassGuard;
use super::scheduler::PeriodicPass;

/// Native value at which the principal is taken out: twice the cost basis
/// plus the estimated exit gas.
pub fn principal_target(cost_basis: Decimal, exit_gas: Decimal) -> Decimal {
    Decimal::TWO * (cost_basis + exit_gas)
}

pub fn should_take_principal(current_value: Decimal, cost_basis: Decimal, exit_gas: Decimal) -> bool {
    current_value >= principal_target(cost_basis, exit_gas)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExitSummary {
    pub checked: usize,
    pub sold: usize,
    pub errors: usize,
}

/// Sells the principal back to native once a position has doubled net of
/// round-trip gas. The trade stays open afterwards.
pub struct ProfitExitMonitor {
    gateway: Arc<dyn MarketGateway>,
    store: Arc<dyn DomainStore>,
    swaps: SwapRunner,
    config: Arc<PipelineConfig>,
    guard: PassGuard,
}

impl ProfitExitMonitor {
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
            guard: PassGuard::new("profit_exit"),
        }
    }

    pub async fn run_pass(&self) -> Result<Option<ExitSummary>, PipelineError> {
        let Some(_pass) = self.guard.try_enter() else {
            return Ok(None);
        };

        let trades = self.store.open_trades_pending_exit().await?;
        let mut summary = ExitSummary {
            checked: trades.len(),
            ..Default::default()
        };

        for trade in &trades {
            match self.evaluate(trade).await {
                Ok(true) => summary.sold += 1,
                Ok(false) => {}
                Err(e) => {
                    summary.errors += 1;
                    tracing::warn!(
                        trade_id = %trade.id,
                        token = %trade.buy_token_address,
                        error = %e,
                        "Profit exit check failed, will retry next pass"
                    );
                }
            }
        }

        Ok(Some(summary))
    }

    /// Check one trade and sell its principal if the target is reached.
    /// Returns whether a sale happened. Nothing is written on failure.
    pub async fn evaluate(&self, trade: &Trade) -> Result<bool, PipelineError> {
        let chain = self.config.chain(&trade.chain).ok_or_else(|| {
            PipelineError::Configuration(format!("unknown chain {:?}", trade.chain))
        })?;
        let native = &chain.native_token;
        let token = trade.buy_token_address.as_str();

        let token_decimals = u8::try_from(trade.buy_token_decimals).map_err(|_| {
            PipelineError::Validation(format!("token decimals {}", trade.buy_token_decimals))
        })?;
        let held = to_base_units(trade.wallet_buy_amount, token_decimals)?;
        if held.is_zero() {
            return Ok(false);
        }

        let valuation = self
            .gateway
            .quote(&chain.name, token, &native.address, held)
            .await?;
        let current_value = from_base_units(valuation.to_amount, valuation.to_token_decimals)?;

        let gas_price = self.gateway.gas_price(&chain.name).await?;
        let exit_gas = from_base_units(
            U256::from(gas_price) * U256::from(valuation.estimated_gas),
            native.decimals,
        )?;

        let cost_basis = trade.cost_basis();
        if !should_take_principal(current_value, cost_basis, exit_gas) {
            tracing::debug!(
                trade_id = %trade.id,
                current_value = %current_value,
                cost_basis = %cost_basis,
                exit_gas = %exit_gas,
                "Principal target not reached"
            );
            return Ok(false);
        }

        let target = principal_target(cost_basis, exit_gas);
        tracing::info!(
            trade_id = %trade.id,
            token = %token,
            current_value = %current_value,
            target = %target,
            "Principal target reached, selling"
        );

        let wallet = self
            .store
            .find_wallet(&trade.chain, &trade.wallet_address)
            .await?
            .ok_or_else(|| {
                PipelineError::Configuration(format!(
                    "wallet {} is no longer managed",
                    trade.wallet_address
                ))
            })?;

        let sizing = self
            .gateway
            .quote(
                &chain.name,
                &native.address,
                token,
                to_base_units(target, native.decimals)?,
            )
            .await?;
        let sell = sizing.to_amount.min(held);
        if sell.is_zero() {
            return Err(PipelineError::Validation(format!(
                "zero sell amount for {token}"
            )));
        }

        let outcome = self
            .swaps
            .execute(SwapOrder {
                chain: &chain.name,
                wallet: &wallet,
                from_token: token,
                to_token: &native.address,
                amount: sell,
                approval: ApprovalRule::WhenNotAbove,
            })
            .await?;

        if let Err(e) = self
            .store
            .mark_principal_sold(trade.id, &outcome.tx_hash)
            .await
        {
            // The sale is confirmed on-chain; without this row the next pass sells again.
            tracing::error!(
                trade_id = %trade.id,
                tx_hash = %outcome.tx_hash,
                sold = %sell,
                error = %e,
                "Principal sale not recorded"
            );
            return Err(e.into());
        }
        counter!("principal_sold_total").increment(1);
        tracing::info!(
            trade_id = %trade.id,
            tx_hash = %outcome.tx_hash,
            sold = %sell,
            "Principal sold"
        );

        Ok(true)
    }
}

#[async_trait]
impl PeriodicPass for ProfitExitMonitor {
    fn name(&self) -> &'static str {
        self.guard.name()
    }

    async fn tick(&self) {
        match self.run_pass().await {
            Ok(Some(summary)) => tracing::info!(
                checked = summary.checked,
                sold = summary.sold,
                errors = summary.errors,
                "Profit exit pass complete"
            ),
            Ok(None) => {}
            Err(e) => tracing::error!(error = %e, "Profit exit pass aborted"),
        }
    }
}
