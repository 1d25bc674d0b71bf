use std::sync::Arc;

use async_trait::async_trait;
use metrics::{counter, gauge};
use rust_decimal::Decimal;

use crate::config::PipelineConfig;
use crate::db::DomainStore;
use crate::errors::PipelineError;
use crate::execution::{from_base_units, to_base_units};
use crate::gateway::MarketGateway;
use crate::models::Trade;

use super::pass_guard::PassGuard;
use super::scheduler::PeriodicPass;

/// A residual position at or below `threshold` stable units is considered
/// exited.
pub fn is_dust(value: Decimal, threshold: Decimal) -> bool {
    value <= threshold
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CloseSummary {
    pub checked: usize,
    pub closed: usize,
    pub errors: usize,
}

/// Closes open trades whose remaining holding is worth no more than the
/// dust threshold.
pub struct PositionCloseMonitor {
    gateway: Arc<dyn MarketGateway>,
    store: Arc<dyn DomainStore>,
    config: Arc<PipelineConfig>,
    guard: PassGuard,
}

impl PositionCloseMonitor {
    pub fn new(
        gateway: Arc<dyn MarketGateway>,
        store: Arc<dyn DomainStore>,
        config: Arc<PipelineConfig>,
    ) -> Self {
        Self {
            gateway,
            store,
            config,
            guard: PassGuard::new("position_close"),
        }
    }

    pub async fn run_pass(&self) -> Result<Option<CloseSummary>, PipelineError> {
        let Some(_pass) = self.guard.try_enter() else {
            return Ok(None);
        };

        let trades = self.store.open_trades().await?;
        let mut summary = CloseSummary {
            checked: trades.len(),
            ..Default::default()
        };

        for trade in &trades {
            match self.evaluate(trade).await {
                Ok(true) => summary.closed += 1,
                Ok(false) => {}
                Err(e) => {
                    summary.errors += 1;
                    tracing::warn!(
                        trade_id = %trade.id,
                        token = %trade.buy_token_address,
                        error = %e,
                        "Position close check failed"
                    );
                }
            }
        }

        gauge!("open_trades").set((summary.checked - summary.closed) as f64);
        Ok(Some(summary))
    }

    /// Close `trade` if its holding is dust. An absent or zero holding
    /// leaves the trade open.
    pub async fn evaluate(&self, trade: &Trade) -> Result<bool, PipelineError> {
        let chain = self.config.chain(&trade.chain).ok_or_else(|| {
            PipelineError::Configuration(format!("unknown chain {:?}", trade.chain))
        })?;
        let token = trade.buy_token_address.as_str();

        let holding = self
            .gateway
            .token_balance(&chain.name, &trade.wallet_address, token)
            .await?;
        let Some(holding) = holding.filter(|h| *h > Decimal::ZERO) else {
            tracing::debug!(trade_id = %trade.id, token = %token, "No holding, leaving open");
            return Ok(false);
        };

        let decimals = self.gateway.token_decimals(&chain.name, token).await?;
        let stable = &chain.stable_token;
        let quote = self
            .gateway
            .quote(
                &chain.name,
                token,
                &stable.address,
                to_base_units(holding, decimals)?,
            )
            .await?;
        let value = from_base_units(quote.to_amount, stable.decimals)?;

        if !is_dust(value, self.config.dust_threshold) {
            tracing::debug!(
                trade_id = %trade.id,
                holding = %holding,
                value = %value,
                "Position still held"
            );
            return Ok(false);
        }

        self.store.close_trade(trade.id).await?;
        counter!("trades_closed_total").increment(1);
        tracing::info!(
            trade_id = %trade.id,
            token = %token,
            holding = %holding,
            value = %value,
            "Trade closed"
        );
        Ok(true)
    }
}

#[async_trait]
impl PeriodicPass for PositionCloseMonitor {
    fn name(&self) -> &'static str {
        self.guard.name()
    }

    async fn tick(&self) {
        match self.run_pass().await {
            Ok(Some(summary)) => tracing::info!(
                checked = summary.checked,
                closed = summary.closed,
                errors = summary.errors,
                "Position close pass complete"
            ),
            Ok(None) => {}
            Err(e) => tracing::error!(error = %e, "Position close pass aborted"),
        }
    }
}
