pub mod address;
pub mod signal;
pub mod trade;
pub mod wallet;

pub use address::WatchedAddress;
pub use signal::BuySignal;
pub use trade::{NewTrade, Trade, TradeStatus};
pub use wallet::ManagedWallet;

/// Lowercase an EVM address so lookups and dedup compare by value.
pub fn normalize_address(address: &str) -> String {
    address.trim().to_ascii_lowercase()
}
