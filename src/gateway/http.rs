use std::collections::HashMap;
use std::time::Duration;

use alloy::primitives::U256;
use async_trait::async_trait;
use rust_decimal::Decimal;
use secrecy::SecretString;

use super::{
    AggregatorClient, ChainClient, ExplorerClient, GatewayError, MarketGateway, Quote,
    RetryPolicy, SwapParams, TransferLeg, TxReceipt, TxSummary, UnsignedTx,
};
use crate::config::{AppConfig, ChainConfig};

struct ChainEntry {
    config: ChainConfig,
    rpc: Option<ChainClient>,
}

/// Production gateway: OKLink for address activity and holdings, the
/// aggregation router for quotes and calldata, JSON-RPC for everything that
/// touches a node.
///
/// Reads go through the retry policy. Submissions never do.
pub struct HttpGateway {
    explorer: ExplorerClient,
    aggregator: AggregatorClient,
    chains: HashMap<String, ChainEntry>,
    retry: RetryPolicy,
}

impl HttpGateway {
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        let mut chains = HashMap::new();
        for chain in config.pipeline.chains.values() {
            let rpc = match &chain.rpc_url {
                Some(url) => Some(ChainClient::new(url, chain.chain_id)?),
                None => {
                    tracing::warn!(chain = %chain.name, "No RPC URL configured, submissions disabled");
                    None
                }
            };
            chains.insert(
                chain.name.clone(),
                ChainEntry {
                    config: chain.clone(),
                    rpc,
                },
            );
        }

        Ok(Self {
            explorer: ExplorerClient::new(
                http.clone(),
                &config.oklink_base_url,
                &config.oklink_api_key,
            ),
            aggregator: AggregatorClient::new(
                http,
                &config.aggregator_base_url,
                config.aggregator_api_key.clone(),
            ),
            chains,
            retry: RetryPolicy {
                max_retries: config.gateway_max_retries,
                base_delay: config.gateway_retry_base,
            },
        })
    }

    fn entry(&self, chain: &str) -> Result<&ChainEntry, GatewayError> {
        self.chains
            .get(chain)
            .ok_or_else(|| GatewayError::Unsupported(format!("chain {chain:?}")))
    }

    fn chain_id(&self, chain: &str) -> Result<u64, GatewayError> {
        Ok(self.entry(chain)?.config.chain_id)
    }

    fn rpc(&self, chain: &str) -> Result<&ChainClient, GatewayError> {
        self.entry(chain)?
            .rpc
            .as_ref()
            .ok_or_else(|| GatewayError::Unsupported(format!("no RPC endpoint for {chain}")))
    }
}

#[async_trait]
impl MarketGateway for HttpGateway {
    async fn latest_transaction(
        &self,
        chain: &str,
        address: &str,
    ) -> Result<Option<TxSummary>, GatewayError> {
        self.retry
            .run("latest_transaction", || {
                self.explorer.latest_transaction(chain, address)
            })
            .await
    }

    async fn transaction_legs(
        &self,
        chain: &str,
        tx_hash: &str,
    ) -> Result<Vec<TransferLeg>, GatewayError> {
        self.retry
            .run("transaction_legs", || {
                self.explorer.transaction_legs(chain, tx_hash)
            })
            .await
    }

    async fn token_balance(
        &self,
        chain: &str,
        address: &str,
        token: &str,
    ) -> Result<Option<Decimal>, GatewayError> {
        self.retry
            .run("token_balance", || {
                self.explorer.token_balance(chain, address, token)
            })
            .await
    }

    async fn quote(
        &self,
        chain: &str,
        from_token: &str,
        to_token: &str,
        amount: U256,
    ) -> Result<Quote, GatewayError> {
        let chain_id = self.chain_id(chain)?;
        self.retry
            .run("quote", || {
                self.aggregator.quote(chain_id, from_token, to_token, amount)
            })
            .await
    }

    async fn build_swap(
        &self,
        chain: &str,
        params: &SwapParams,
    ) -> Result<UnsignedTx, GatewayError> {
        let chain_id = self.chain_id(chain)?;
        self.retry
            .run("build_swap", || self.aggregator.build_swap(chain_id, params))
            .await
    }

    async fn allowance(
        &self,
        chain: &str,
        token: &str,
        owner: &str,
    ) -> Result<U256, GatewayError> {
        let chain_id = self.chain_id(chain)?;
        self.retry
            .run("allowance", || self.aggregator.allowance(chain_id, token, owner))
            .await
    }

    async fn build_approval(
        &self,
        chain: &str,
        token: &str,
        owner: &str,
        amount: Option<U256>,
    ) -> Result<UnsignedTx, GatewayError> {
        let chain_id = self.chain_id(chain)?;
        self.retry
            .run("build_approval", || {
                self.aggregator.build_approval(chain_id, token, owner, amount)
            })
            .await
    }

    async fn submit(
        &self,
        chain: &str,
        secret_key: &SecretString,
        tx: &UnsignedTx,
    ) -> Result<String, GatewayError> {
        self.rpc(chain)?.submit(secret_key, tx).await
    }

    async fn wait_receipt(
        &self,
        chain: &str,
        tx_hash: &str,
        max_attempts: u32,
        interval: Duration,
    ) -> Result<TxReceipt, GatewayError> {
        self.rpc(chain)?
            .wait_receipt(tx_hash, max_attempts, interval)
            .await
    }

    async fn token_decimals(&self, chain: &str, token: &str) -> Result<u8, GatewayError> {
        let entry = self.entry(chain)?;
        if token.eq_ignore_ascii_case(&entry.config.native_token.address) {
            return Ok(entry.config.native_token.decimals);
        }
        if token.eq_ignore_ascii_case(&entry.config.stable_token.address) {
            return Ok(entry.config.stable_token.decimals);
        }
        let rpc = self.rpc(chain)?;
        self.retry
            .run("token_decimals", || rpc.token_decimals(token))
            .await
    }

    async fn gas_price(&self, chain: &str) -> Result<u128, GatewayError> {
        let rpc = self.rpc(chain)?;
        self.retry.run("gas_price", || rpc.gas_price()).await
    }
}
