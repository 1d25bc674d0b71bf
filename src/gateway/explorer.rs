use chrono::{DateTime, Utc};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::types::{TransferLeg, TxSummary};
use super::GatewayError;

/// OKLink v5 explorer client: address activity, transaction transfer legs
/// and token holdings.
#[derive(Debug, Clone)]
pub struct ExplorerClient {
    http: Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    code: String,
    #[serde(default)]
    msg: String,
    #[serde(default = "Vec::new")]
    data: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiTransactionPage {
    #[serde(default)]
    transaction_lists: Vec<ApiTransaction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiTransaction {
    tx_id: String,
    transaction_time: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiTransactionDetail {
    #[serde(default)]
    token_transfer_details: Vec<ApiTokenTransfer>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiTokenTransfer {
    #[serde(default)]
    token_contract_address: String,
    #[serde(default)]
    symbol: String,
    #[serde(default)]
    from: String,
    #[serde(default)]
    to: String,
    #[serde(default)]
    token_id: String,
    #[serde(default)]
    amount: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiBalancePage {
    #[serde(default)]
    token_list: Vec<ApiHolding>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiHolding {
    holding_amount: String,
}

impl ExplorerClient {
    pub fn new(http: Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, GatewayError> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self
            .http
            .get(&url)
            .header("Ok-Access-Key", &self.api_key)
            .query(query)
            .send()
            .await?
            .error_for_status()?;

        let envelope: Envelope<T> = resp.json().await?;
        if envelope.code != "0" {
            // 50011 is OKLink's rate-limit code.
            if envelope.code == "50011" {
                return Err(GatewayError::Transient(envelope.msg));
            }
            return Err(GatewayError::InvalidResponse(format!(
                "explorer code {}: {}",
                envelope.code, envelope.msg
            )));
        }
        Ok(envelope.data)
    }

    /// Latest ERC-20 transfer transaction involving `address`.
    pub async fn latest_transaction(
        &self,
        chain: &str,
        address: &str,
    ) -> Result<Option<TxSummary>, GatewayError> {
        let pages: Vec<ApiTransactionPage> = self
            .get(
                "/api/v5/explorer/address/transaction-list",
                &[
                    ("address", address.to_string()),
                    ("chainShortName", chain.to_string()),
                    ("protocolType", "token_20".into()),
                    ("limit", "1".into()),
                    ("page", "1".into()),
                ],
            )
            .await?;

        let Some(tx) = pages
            .into_iter()
            .next()
            .and_then(|p| p.transaction_lists.into_iter().next())
        else {
            return Ok(None);
        };

        Ok(Some(TxSummary {
            timestamp: parse_millis(&tx.transaction_time)?,
            tx_hash: tx.tx_id,
        }))
    }

    pub async fn transaction_legs(
        &self,
        chain: &str,
        tx_hash: &str,
    ) -> Result<Vec<TransferLeg>, GatewayError> {
        let details: Vec<ApiTransactionDetail> = self
            .get(
                "/api/v5/explorer/transaction/transaction-fills",
                &[
                    ("txid", tx_hash.to_string()),
                    ("chainShortName", chain.to_string()),
                ],
            )
            .await?;

        let legs = details
            .into_iter()
            .next()
            .map(|d| {
                d.token_transfer_details
                    .into_iter()
                    .map(|t| TransferLeg {
                        from: t.from,
                        to: t.to,
                        token_address: t.token_contract_address,
                        symbol: t.symbol,
                        token_id: t.token_id,
                        amount: t.amount,
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(legs)
    }

    pub async fn token_balance(
        &self,
        chain: &str,
        address: &str,
        token: &str,
    ) -> Result<Option<Decimal>, GatewayError> {
        let pages: Vec<ApiBalancePage> = self
            .get(
                "/api/v5/explorer/address/address-balance-fills",
                &[
                    ("address", address.to_ascii_lowercase()),
                    ("chainShortName", chain.to_string()),
                    ("protocolType", "token_20".into()),
                    ("tokenContractAddress", token.to_ascii_lowercase()),
                    ("limit", "1".into()),
                    ("page", "1".into()),
                ],
            )
            .await?;

        let Some(holding) = pages
            .into_iter()
            .next()
            .and_then(|p| p.token_list.into_iter().next())
        else {
            return Ok(None);
        };

        holding
            .holding_amount
            .trim()
            .parse::<Decimal>()
            .map(Some)
            .map_err(|e| {
                GatewayError::InvalidResponse(format!(
                    "holding amount {:?}: {e}",
                    holding.holding_amount
                ))
            })
    }
}

/// Explorer timestamps are millisecond epoch strings.
fn parse_millis(raw: &str) -> Result<DateTime<Utc>, GatewayError> {
    raw.trim()
        .parse::<i64>()
        .ok()
        .and_then(DateTime::from_timestamp_millis)
        .ok_or_else(|| GatewayError::InvalidResponse(format!("transaction time {raw:?}")))
}
