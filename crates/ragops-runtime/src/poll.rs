//! Bounded readiness polling.

use std::future::Future;
use std::time::Duration;

use ragops_core::PollConfig;
use tokio::time::Instant;
use tracing::info;

use crate::adapter::ApiError;

/// What a single probe observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollStatus<T> {
    Ready(T),
    Pending(String),
    Failed(String),
}

#[derive(Debug, thiserror::Error)]
pub enum PollError {
    #[error("timed out waiting for {what} after {attempts} attempt(s) (last status: {last_status})")]
    TimedOut {
        what: String,
        attempts: u32,
        last_status: String,
    },

    #[error("{what} failed: {message}")]
    Failed { what: String, message: String },

    #[error(transparent)]
    Api(#[from] ApiError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub timeout: Duration,
    pub max_attempts: Option<u32>,
}

impl From<&PollConfig> for PollPolicy {
    fn from(config: &PollConfig) -> Self {
        Self {
            interval: config.interval(),
            timeout: config.timeout(),
            max_attempts: config.max_attempts,
        }
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::from(&PollConfig::default())
    }
}

/// Probe until ready, failed, or out of time.
///
/// The first probe runs immediately. After a pending probe the poller sleeps
/// `interval`, unless the deadline has passed or the attempt cap is reached.
pub async fn wait_until<T, F, Fut>(
    policy: &PollPolicy,
    what: &str,
    mut probe: F,
) -> Result<T, PollError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<PollStatus<T>, ApiError>>,
{
    let started = Instant::now();
    let mut attempts = 0u32;

    loop {
        attempts += 1;
        match probe().await? {
            PollStatus::Ready(value) => return Ok(value),
            PollStatus::Failed(message) => {
                return Err(PollError::Failed {
                    what: what.to_string(),
                    message,
                });
            }
            PollStatus::Pending(status) => {
                let capped = policy.max_attempts.is_some_and(|max| attempts >= max);
                if capped || started.elapsed() >= policy.timeout {
                    return Err(PollError::TimedOut {
                        what: what.to_string(),
                        attempts,
                        last_status: status,
                    });
                }
                info!(
                    what,
                    attempts,
                    "Current status: {}. Waiting {} seconds...",
                    status,
                    policy.interval.as_secs()
                );
                tokio::time::sleep(policy.interval).await;
            }
        }
    }
}
