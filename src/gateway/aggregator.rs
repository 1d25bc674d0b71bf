use alloy::primitives::U256;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::types::{Quote, SwapParams, UnsignedTx};
use super::GatewayError;

/// 1inch v5 aggregation router client: quotes, swap calldata and router
/// approvals.
#[derive(Debug, Clone)]
pub struct AggregatorClient {
    http: Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiToken {
    decimals: u8,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiQuote {
    to_token: ApiToken,
    to_token_amount: String,
    #[serde(default)]
    estimated_gas: u64,
}

#[derive(Debug, Deserialize)]
struct ApiSwap {
    tx: ApiTxData,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiTxData {
    #[serde(default)]
    from: String,
    to: String,
    data: String,
    #[serde(default)]
    value: String,
    #[serde(default)]
    gas: u64,
    gas_price: String,
}

#[derive(Debug, Deserialize)]
struct ApiAllowance {
    allowance: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiApproval {
    to: String,
    data: String,
    #[serde(default)]
    value: String,
    gas_price: String,
}

impl AggregatorClient {
    pub fn new(http: Client, base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }

    fn request(&self, chain_id: u64, path: &str) -> RequestBuilder {
        let url = format!("{}/{}/{}", self.base_url, chain_id, path);
        let req = self.http.get(&url);
        match &self.api_key {
            Some(key) => req.bearer_auth(key),
            None => req,
        }
    }

    async fn fetch<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, GatewayError> {
        let resp = req.send().await?.error_for_status()?;
        Ok(resp.json().await?)
    }

    pub async fn quote(
        &self,
        chain_id: u64,
        from_token: &str,
        to_token: &str,
        amount: U256,
    ) -> Result<Quote, GatewayError> {
        let req = self.request(chain_id, "quote").query(&[
            ("fromTokenAddress", from_token.to_string()),
            ("toTokenAddress", to_token.to_string()),
            ("amount", amount.to_string()),
        ]);
        let quote: ApiQuote = self.fetch(req).await?;

        Ok(Quote {
            to_amount: parse_u256("toTokenAmount", &quote.to_token_amount)?,
            to_token_decimals: quote.to_token.decimals,
            estimated_gas: quote.estimated_gas,
        })
    }

    pub async fn build_swap(
        &self,
        chain_id: u64,
        params: &SwapParams,
    ) -> Result<UnsignedTx, GatewayError> {
        let req = self.request(chain_id, "swap").query(&[
            ("fromTokenAddress", params.from_token.clone()),
            ("toTokenAddress", params.to_token.clone()),
            ("amount", params.amount.to_string()),
            ("fromAddress", params.from_address.clone()),
            ("slippage", params.slippage_pct.normalize().to_string()),
        ]);
        let swap: ApiSwap = self.fetch(req).await?;
        let tx = swap.tx;

        Ok(UnsignedTx {
            from: if tx.from.is_empty() {
                params.from_address.clone()
            } else {
                tx.from
            },
            to: tx.to,
            data: tx.data,
            value: parse_u256_or_zero("value", &tx.value)?,
            gas_price: parse_u128("gasPrice", &tx.gas_price)?,
            gas_limit: (tx.gas > 0).then_some(tx.gas),
        })
    }

    pub async fn allowance(
        &self,
        chain_id: u64,
        token: &str,
        owner: &str,
    ) -> Result<U256, GatewayError> {
        let req = self.request(chain_id, "approve/allowance").query(&[
            ("tokenAddress", token.to_string()),
            ("walletAddress", owner.to_string()),
        ]);
        let allowance: ApiAllowance = self.fetch(req).await?;
        parse_u256("allowance", &allowance.allowance)
    }

    pub async fn build_approval(
        &self,
        chain_id: u64,
        token: &str,
        owner: &str,
        amount: Option<U256>,
    ) -> Result<UnsignedTx, GatewayError> {
        let mut query = vec![("tokenAddress", token.to_string())];
        if let Some(amount) = amount {
            query.push(("amount", amount.to_string()));
        }
        let req = self.request(chain_id, "approve/transaction").query(&query);
        let approval: ApiApproval = self.fetch(req).await?;

        Ok(UnsignedTx {
            from: owner.to_string(),
            to: approval.to,
            data: approval.data,
            value: parse_u256_or_zero("value", &approval.value)?,
            gas_price: parse_u128("gasPrice", &approval.gas_price)?,
            gas_limit: None,
        })
    }
}

fn parse_u256(field: &str, raw: &str) -> Result<U256, GatewayError> {
    U256::from_str_radix(raw.trim(), 10)
        .map_err(|e| GatewayError::InvalidResponse(format!("{field} {raw:?}: {e}")))
}

fn parse_u256_or_zero(field: &str, raw: &str) -> Result<U256, GatewayError> {
    if raw.trim().is_empty() {
        return Ok(U256::ZERO);
    }
    parse_u256(field, raw)
}

fn parse_u128(field: &str, raw: &str) -> Result<u128, GatewayError> {
    raw.trim()
        .parse::<u128>()
        .map_err(|e| GatewayError::InvalidResponse(format!("{field} {raw:?}: {e}")))
}
