use std::sync::Arc;

use alloy::primitives::U256;
use chrono::{DateTime, Utc};

use crate::config::PipelineConfig;
use crate::errors::PipelineError;
use crate::gateway::{MarketGateway, SwapParams, TxReceipt, UnsignedTx};
use crate::models::ManagedWallet;

use super::submission_queue::SubmissionQueue;

/// When the router must be (re-)approved before a swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalRule {
    /// Only when nothing has been approved yet.
    WhenZero,
    /// When the current allowance does not exceed the amount being sold.
    WhenNotAbove,
}

impl ApprovalRule {
    pub fn needs_approval(self, allowance: U256, amount: U256) -> bool {
        match self {
            ApprovalRule::WhenZero => allowance.is_zero(),
            ApprovalRule::WhenNotAbove => allowance.is_zero() || allowance <= amount,
        }
    }
}

/// One leg of work for [`SwapRunner::execute`].
#[derive(Debug, Clone)]
pub struct SwapOrder<'a> {
    pub chain: &'a str,
    pub wallet: &'a ManagedWallet,
    pub from_token: &'a str,
    pub to_token: &'a str,
    /// Input amount in `from_token` base units.
    pub amount: U256,
    pub approval: ApprovalRule,
}

#[derive(Debug, Clone)]
pub struct SwapOutcome {
    pub tx_hash: String,
    pub submitted_at: DateTime<Utc>,
    pub receipt: TxReceipt,
}

/// Approve-if-needed, swap and confirm, holding the wallet's submission
/// lane for the whole sequence.
#[derive(Clone)]
pub struct SwapRunner {
    gateway: Arc<dyn MarketGateway>,
    queue: SubmissionQueue,
    config: Arc<PipelineConfig>,
}

impl SwapRunner {
    pub fn new(
        gateway: Arc<dyn MarketGateway>,
        queue: SubmissionQueue,
        config: Arc<PipelineConfig>,
    ) -> Self {
        Self {
            gateway,
            queue,
            config,
        }
    }

    pub async fn execute(&self, order: SwapOrder<'_>) -> Result<SwapOutcome, PipelineError> {
        let SwapOrder {
            chain,
            wallet,
            from_token,
            to_token,
            amount,
            approval,
        } = order;

        let _lane = self.queue.acquire(chain, &wallet.address).await;

        let allowance = self
            .gateway
            .allowance(chain, from_token, &wallet.address)
            .await?;

        if approval.needs_approval(allowance, amount) {
            tracing::info!(
                chain,
                wallet = %wallet.address,
                token = %from_token,
                allowance = %allowance,
                "Approving router"
            );
            let tx = self
                .gateway
                .build_approval(chain, from_token, &wallet.address, None)
                .await?;
            self.submit_and_confirm(chain, wallet, &tx, "approval").await?;
        }

        let params = SwapParams {
            from_token: from_token.to_string(),
            to_token: to_token.to_string(),
            amount,
            from_address: wallet.address.clone(),
            slippage_pct: self.config.slippage_pct,
        };
        let tx = self.gateway.build_swap(chain, &params).await?;

        let submitted_at = Utc::now();
        let (tx_hash, receipt) = self.submit_and_confirm(chain, wallet, &tx, "swap").await?;

        tracing::info!(
            chain,
            wallet = %wallet.address,
            from_token = %from_token,
            to_token = %to_token,
            amount = %amount,
            tx_hash = %tx_hash,
            gas_used = receipt.gas_used,
            "Swap confirmed"
        );

        Ok(SwapOutcome {
            tx_hash,
            submitted_at,
            receipt,
        })
    }

    /// Submission and receipt failures are terminal for the step; nothing
    /// here is retried.
    async fn submit_and_confirm(
        &self,
        chain: &str,
        wallet: &ManagedWallet,
        tx: &UnsignedTx,
        what: &str,
    ) -> Result<(String, TxReceipt), PipelineError> {
        let tx_hash = self
            .gateway
            .submit(chain, wallet.secret_key(), tx)
            .await
            .map_err(|e| PipelineError::Execution(format!("{what} submission failed: {e}")))?;

        let policy = self.config.receipt;
        let receipt = self
            .gateway
            .wait_receipt(chain, &tx_hash, policy.max_attempts, policy.interval)
            .await
            .map_err(|e| PipelineError::Execution(format!("{what} {tx_hash}: {e}")))?;

        if !receipt.success {
            return Err(PipelineError::Execution(format!(
                "{what} {tx_hash} reverted on-chain"
            )));
        }

        Ok((tx_hash, receipt))
    }
}
