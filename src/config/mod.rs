use std::collections::{HashMap, HashSet};
use std::env;
use std::time::Duration;

use rust_decimal::Decimal;

const DEFAULT_OKLINK_URL: &str = "https://www.oklink.com";
const DEFAULT_AGGREGATOR_URL: &str = "https://api.1inch.io/v5.0";
const DEFAULT_REFERENCE_TOKENS: &str = "BNB,WBNB,ETH,WETH,USDT,USDC,DAI";

/// A token the engine prices against on a given chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenInfo {
    pub address: String,
    pub decimals: u8,
}

impl TokenInfo {
    fn new(address: &str, decimals: u8) -> Self {
        Self {
            address: address.to_ascii_lowercase(),
            decimals,
        }
    }
}

/// Per-chain constants: where to send transactions and which tokens anchor
/// valuation.
#[derive(Debug, Clone)]
pub struct ChainConfig {
    /// Short name used in every record (`eth`, `bsc`).
    pub name: String,
    pub chain_id: u64,
    pub rpc_url: Option<String>,
    /// Token spent when mirroring a buy and received on a profit exit.
    pub native_token: TokenInfo,
    /// Stable-value token used for the dust check.
    pub stable_token: TokenInfo,
}

impl ChainConfig {
    pub fn ethereum(rpc_url: Option<String>) -> Self {
        Self {
            name: "eth".into(),
            chain_id: 1,
            rpc_url,
            native_token: TokenInfo::new("0xeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeee", 18),
            stable_token: TokenInfo::new("0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48", 6),
        }
    }

    pub fn bsc(rpc_url: Option<String>) -> Self {
        Self {
            name: "bsc".into(),
            chain_id: 56,
            rpc_url,
            native_token: TokenInfo::new("0xbb4CdB9CBd36B01bD1cBaEBF2De08d9173bc095c", 18),
            stable_token: TokenInfo::new("0x55d398326f99059ff775485246999027b3197955", 18),
        }
    }
}

/// How long to wait for a submitted transaction to be mined.
#[derive(Debug, Clone, Copy)]
pub struct ReceiptPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl Default for ReceiptPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 30,
            interval: Duration::from_secs(3),
        }
    }
}

/// Immutable settings shared by the detector, executor and monitors.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Uppercased symbols treated as valuation anchors.
    pub reference_symbols: HashSet<String>,
    pub dust_threshold: Decimal,
    pub slippage_pct: Decimal,
    pub receipt: ReceiptPolicy,
    pub chains: HashMap<String, ChainConfig>,
}

impl PipelineConfig {
    pub fn chain(&self, name: &str) -> Option<&ChainConfig> {
        self.chains.get(name)
    }

    pub fn is_reference_symbol(&self, symbol: &str) -> bool {
        self.reference_symbols
            .contains(&symbol.trim().to_ascii_uppercase())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let chains = [ChainConfig::ethereum(None), ChainConfig::bsc(None)]
            .into_iter()
            .map(|c| (c.name.clone(), c))
            .collect();

        Self {
            reference_symbols: parse_symbols(DEFAULT_REFERENCE_TOKENS),
            dust_threshold: Decimal::from(10),
            slippage_pct: Decimal::from(20),
            receipt: ReceiptPolicy::default(),
            chains,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub api_enabled: bool,
    pub api_token: Option<String>,

    // Market data / routing
    pub oklink_base_url: String,
    pub oklink_api_key: String,
    pub aggregator_base_url: String,
    pub aggregator_api_key: Option<String>,
    pub gateway_max_retries: u32,
    pub gateway_retry_base: Duration,

    // Pass scheduling
    pub detect_interval_secs: u64,
    pub profit_exit_interval_secs: u64,
    pub position_close_interval_secs: u64,

    pub pipeline: PipelineConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = PipelineConfig::default();

        let chains = [
            ChainConfig::ethereum(env::var("ETH_RPC_URL").ok()),
            ChainConfig::bsc(env::var("BSC_RPC_URL").ok()),
        ]
        .into_iter()
        .map(|c| (c.name.clone(), c))
        .collect();

        let pipeline = PipelineConfig {
            reference_symbols: parse_symbols(
                &env::var("REFERENCE_TOKENS").unwrap_or_else(|_| DEFAULT_REFERENCE_TOKENS.into()),
            ),
            dust_threshold: env_or("DUST_THRESHOLD_USD", defaults.dust_threshold),
            slippage_pct: env_or("SWAP_SLIPPAGE_PCT", defaults.slippage_pct),
            receipt: receipt_policy_from_env(defaults.receipt),
            chains,
        };

        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()?,
            api_enabled: env_or("API_ENABLED", true),
            api_token: env::var("API_TOKEN").ok().filter(|t| !t.is_empty()),

            oklink_base_url: env::var("OKLINK_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_OKLINK_URL.into()),
            oklink_api_key: env::var("OKLINK_API_KEY").unwrap_or_default(),
            aggregator_base_url: env::var("AGGREGATOR_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_AGGREGATOR_URL.into()),
            aggregator_api_key: env::var("AGGREGATOR_API_KEY").ok().filter(|k| !k.is_empty()),
            gateway_max_retries: env_or("GATEWAY_MAX_RETRIES", 3),
            gateway_retry_base: Duration::from_millis(env_or("GATEWAY_RETRY_BASE_MS", 500)),

            detect_interval_secs: env_or("DETECT_INTERVAL_SECS", 15),
            profit_exit_interval_secs: env_or("PROFIT_EXIT_INTERVAL_SECS", 60),
            position_close_interval_secs: env_or("POSITION_CLOSE_INTERVAL_SECS", 300),

            pipeline,
        })
    }
}

/// Read and parse an env var, falling back to `default` when unset or invalid.
fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn receipt_policy_from_env(defaults: ReceiptPolicy) -> ReceiptPolicy {
    ReceiptPolicy {
        max_attempts: env_or("RECEIPT_MAX_ATTEMPTS", defaults.max_attempts),
        interval: Duration::from_secs(env_or(
            "RECEIPT_POLL_INTERVAL_SECS",
            defaults.interval.as_secs(),
        )),
    }
}

fn parse_symbols(raw: &str) -> HashSet<String> {
    raw.split(',')
        .map(|s| s.trim().to_ascii_uppercase())
        .filter(|s| !s.is_empty())
        .collect()
}
