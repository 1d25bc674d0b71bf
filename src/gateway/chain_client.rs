use std::str::FromStr;
use std::time::Duration;

use alloy::consensus::{SignableTransaction, TxEnvelope, TxLegacy};
use alloy::eips::eip2718::Encodable2718;
use alloy::network::TxSignerSync;
use alloy::primitives::{Address, Bytes, TxKind, B256};
use alloy::providers::{Provider, RootProvider};
use alloy::signers::local::PrivateKeySigner;
use alloy::transports::http::reqwest::Url;
use alloy::transports::TransportError;
use secrecy::{ExposeSecret, SecretString};
use tokio::time::sleep;

use super::types::{TxReceipt, UnsignedTx};
use super::GatewayError;

/// Gas limit used when the router does not supply one.
const DEFAULT_GAS_LIMIT: u64 = 1_000_000;

alloy::sol! {
    #[sol(rpc)]
    interface IERC20Metadata {
        function decimals() external view returns (uint8);
    }
}

/// EVM JSON-RPC client for one chain: signing, broadcast, receipts and
/// ERC-20 metadata.
#[derive(Clone)]
pub struct ChainClient {
    chain_id: u64,
    provider: RootProvider,
}

impl ChainClient {
    pub fn new(rpc_url: &str, chain_id: u64) -> anyhow::Result<Self> {
        let url: Url = rpc_url.parse()?;
        Ok(Self {
            chain_id,
            provider: RootProvider::new_http(url),
        })
    }

    /// Sign `tx` as a legacy EIP-155 transaction with the pending nonce and
    /// broadcast it. Returns the transaction hash.
    pub async fn submit(
        &self,
        secret_key: &SecretString,
        tx: &UnsignedTx,
    ) -> Result<String, GatewayError> {
        let signer = PrivateKeySigner::from_str(secret_key.expose_secret().trim())
            .map_err(|e| GatewayError::Rejected(format!("invalid signing key: {e}")))?;
        let from = signer.address();

        let to = Address::from_str(&tx.to)
            .map_err(|e| GatewayError::InvalidResponse(format!("tx target {:?}: {e}", tx.to)))?;
        let input = Bytes::from_str(&tx.data)
            .map_err(|e| GatewayError::InvalidResponse(format!("tx calldata: {e}")))?;

        let nonce = self
            .provider
            .get_transaction_count(from)
            .pending()
            .await
            .map_err(rpc_error)?;

        let mut legacy = TxLegacy {
            chain_id: Some(self.chain_id),
            nonce,
            gas_price: tx.gas_price,
            gas_limit: tx.gas_limit.unwrap_or(DEFAULT_GAS_LIMIT),
            to: TxKind::Call(to),
            value: tx.value,
            input,
        };

        let signature = signer
            .sign_transaction_sync(&mut legacy)
            .map_err(|e| GatewayError::Rejected(format!("signing failed: {e}")))?;
        let envelope: TxEnvelope = legacy.into_signed(signature).into();

        let pending = self
            .provider
            .send_raw_transaction(&envelope.encoded_2718())
            .await
            .map_err(rpc_error)?;

        let tx_hash = format!("{:#x}", pending.tx_hash());
        tracing::info!(
            chain_id = self.chain_id,
            from = %from,
            nonce,
            tx_hash = %tx_hash,
            "Transaction broadcast"
        );
        Ok(tx_hash)
    }

    pub async fn wait_receipt(
        &self,
        tx_hash: &str,
        max_attempts: u32,
        interval: Duration,
    ) -> Result<TxReceipt, GatewayError> {
        let hash = B256::from_str(tx_hash)
            .map_err(|e| GatewayError::InvalidResponse(format!("tx hash {tx_hash:?}: {e}")))?;

        for attempt in 1..=max_attempts {
            match self.provider.get_transaction_receipt(hash).await {
                Ok(Some(receipt)) => {
                    return Ok(TxReceipt {
                        success: receipt.status(),
                        gas_used: receipt.gas_used,
                        effective_gas_price: receipt.effective_gas_price,
                    });
                }
                Ok(None) => {
                    tracing::debug!(tx_hash, attempt, "Receipt not yet available");
                }
                Err(e) => {
                    tracing::warn!(tx_hash, attempt, error = %e, "Receipt lookup failed");
                }
            }
            if attempt < max_attempts {
                sleep(interval).await;
            }
        }

        Err(GatewayError::ReceiptTimeout {
            tx_hash: tx_hash.to_string(),
            attempts: max_attempts,
        })
    }

    pub async fn token_decimals(&self, token: &str) -> Result<u8, GatewayError> {
        let address = Address::from_str(token)
            .map_err(|e| GatewayError::InvalidResponse(format!("token {token:?}: {e}")))?;
        let contract = IERC20Metadata::new(address, &self.provider);
        contract
            .decimals()
            .call()
            .await
            .map_err(|e| GatewayError::Transient(format!("decimals() call: {e}")))
    }

    pub async fn gas_price(&self) -> Result<u128, GatewayError> {
        self.provider.get_gas_price().await.map_err(rpc_error)
    }
}

/// Node-side error responses are rejections; everything else is transport.
fn rpc_error(e: TransportError) -> GatewayError {
    if e.is_error_resp() {
        GatewayError::Rejected(e.to_string())
    } else {
        GatewayError::Transient(e.to_string())
    }
}
