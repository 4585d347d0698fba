//! Fixed-interval polling for long-running remote jobs
//!
//! Some render backends answer "still processing" and expect the client to
//! come back later. This module provides the bounded polling loop those
//! backends share. The interval is fixed and the number of attempts is capped.

use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Configuration for polling behavior
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Maximum number of polls before giving up
    pub max_attempts: u32,

    /// Delay before each poll
    pub interval: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            max_attempts: 30,
            interval: Duration::from_secs(3),
        }
    }
}

impl PollConfig {
    /// Create a polling configuration
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval,
        }
    }
}

/// Outcome of a single poll
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollStatus<T> {
    /// The job finished (successfully or not) with this value
    Ready(T),
    /// The job is still running
    Pending,
}

/// Poll an operation until it reports [`PollStatus::Ready`]
///
/// Sleeps `config.interval` before every attempt. Returns `Ok(None)` if the
/// operation is still pending after `config.max_attempts` polls, and the
/// operation's error as soon as one is returned.
///
/// # Example
///
/// ```no_run
/// use newsquiz::utils::poll::{poll_until, PollConfig, PollStatus};
///
/// # async fn example() -> Result<(), std::io::Error> {
/// let config = PollConfig::default();
/// let value = poll_until(&config, || async { Ok::<_, std::io::Error>(PollStatus::Ready(7)) }).await?;
/// assert_eq!(value, Some(7));
/// # Ok(())
/// # }
/// ```
pub async fn poll_until<T, E, F, Fut>(config: &PollConfig, mut operation: F) -> Result<Option<T>, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<PollStatus<T>, E>>,
{
    for attempt in 1..=config.max_attempts {
        tokio::time::sleep(config.interval).await;

        match operation().await? {
            PollStatus::Ready(value) => {
                debug!(attempt = attempt, "Poll completed");
                return Ok(Some(value));
            }
            PollStatus::Pending => {
                debug!(
                    attempt = attempt,
                    max_attempts = config.max_attempts,
                    "Job still pending"
                );
            }
        }
    }

    Ok(None)
}
