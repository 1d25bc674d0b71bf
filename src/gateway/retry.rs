use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;

use super::GatewayError;

const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

/// Bounded exponential backoff for idempotent gateway reads.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Extra attempts after the first failure.
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    fn delay(&self, attempt: u32) -> Duration {
        (self.base_delay * 2u32.saturating_pow(attempt)).min(MAX_RETRY_DELAY)
    }

    /// Run `op`, retrying only on [`GatewayError::Transient`].
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> Result<T, GatewayError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, GatewayError>>,
    {
        let mut attempt = 0u32;
        loop {
            match op().await {
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    let delay = self.delay(attempt);
                    attempt += 1;
                    tracing::warn!(
                        op = label,
                        error = %e,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "Gateway call failed, retrying"
                    );
                    sleep(delay).await;
                }
                other => return other,
            }
        }
    }
}
