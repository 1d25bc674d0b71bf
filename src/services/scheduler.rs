use std::sync::Arc;

use async_trait::async_trait;
use tokio::time::{interval, Duration, MissedTickBehavior};

/// A pass that can be triggered on a timer or by an external scheduler.
#[async_trait]
pub trait PeriodicPass: Send + Sync {
    fn name(&self) -> &'static str;

    /// Run one pass, logging its own outcome.
    async fn tick(&self);
}

/// Trigger `pass` every `interval_secs` until the task is dropped. Ticks
/// missed while a pass runs long are skipped, not bunched up.
pub async fn run_periodic(pass: Arc<dyn PeriodicPass>, interval_secs: u64) {
    let mut ticker = interval(Duration::from_secs(interval_secs.max(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    tracing::info!(pass = pass.name(), interval_secs, "Scheduler started");

    loop {
        ticker.tick().await;
        pass.tick().await;
    }
}
