use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row for watched_addresses table.
///
/// `last_seen_tx_hash` / `last_seen_tx_time` only ever move forward and are
/// written by the signal detector alone.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WatchedAddress {
    pub id: Uuid,
    pub chain: String,
    pub address: String,
    pub last_seen_tx_hash: Option<String>,
    pub last_seen_tx_time: Option<DateTime<Utc>>,
    pub enabled: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl WatchedAddress {
    /// True when `tx_hash` is the transaction this address was last evaluated at.
    pub fn has_seen(&self, tx_hash: &str) -> bool {
        self.last_seen_tx_hash
            .as_deref()
            .is_some_and(|seen| seen.eq_ignore_ascii_case(tx_hash))
    }
}
