use std::future::Future;
use std::time::Duration;

use serde::Deserialize;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::app::Result;

/// Fixed-delay retry settings applied to listing, page fetch and delivery.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts including the first (default: 5)
    pub max_attempts: u32,
    /// Pause between attempts in seconds (default: 300)
    pub delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            delay_secs: 300,
        }
    }
}

impl RetryConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_secs(self.delay_secs)
    }

    /// A single attempt, no waiting.
    pub fn once() -> Self {
        Self {
            max_attempts: 1,
            delay_secs: 0,
        }
    }
}

/// Run `f` until it succeeds or the attempt cap is reached, whatever kind of
/// error each attempt fails with.
///
/// Returns the last error when every attempt fails.
pub async fn retry<F, Fut, T>(config: &RetryConfig, operation: &str, mut f: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match f().await {
            Ok(value) => {
                if attempt > 1 {
                    debug!("{} succeeded on attempt {}", operation, attempt);
                }
                return Ok(value);
            }
            Err(e) if attempt >= max_attempts => {
                warn!("{} failed after {} attempts: {}", operation, max_attempts, e);
                return Err(e);
            }
            Err(e) => {
                warn!(
                    "{} failed on attempt {}/{}: {}. Retrying in {}s",
                    operation, attempt, max_attempts, e, config.delay_secs
                );
                sleep(config.delay()).await;
                attempt += 1;
            }
        }
    }
}
