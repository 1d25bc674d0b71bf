use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::models::normalize_address;

type LaneKey = (String, String);

/// Serializes on-chain submissions per (chain, wallet) so two passes never
/// race for the same nonce.
///
/// Holders keep the returned guard across approve, swap and receipt wait.
/// Cloning shares the underlying lanes.
#[derive(Debug, Clone, Default)]
pub struct SubmissionQueue {
    lanes: Arc<Mutex<HashMap<LaneKey, Arc<Mutex<()>>>>>,
}

impl SubmissionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive use of `wallet` on `chain`.
    pub async fn acquire(&self, chain: &str, wallet: &str) -> OwnedMutexGuard<()> {
        let lane = {
            let mut lanes = self.lanes.lock().await;
            lanes
                .entry((chain.to_string(), normalize_address(wallet)))
                .or_default()
                .clone()
        };
        lane.lock_owned().await
    }
}
