//! Bounded retry with a fixed delay or a server-provided wait

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

use crate::config::UserConfig;

/// Errors that know whether another attempt could succeed
pub trait RetryableError {
    fn is_retryable(&self) -> bool;

    /// Wait requested by the server, if any
    fn retry_after(&self) -> Option<Duration> {
        None
    }
}

/// Why a retried operation gave up
#[derive(Debug)]
pub enum RetryError<E> {
    /// Every attempt failed with a retryable error
    Exhausted { attempts: u32, last: E },
    /// A non-retryable error ended the loop early
    Fatal(E),
}

/// Retry strategy: attempt bound plus delay
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
    pub honor_retry_after: bool,
    pub max_retry_after: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            delay: Duration::from_millis(2000),
            honor_retry_after: true,
            max_retry_after: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    #[cfg(test)]
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
            ..Self::default()
        }
    }

    pub fn from_config(config: &UserConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            delay: config.retry_delay(),
            honor_retry_after: config.honor_retry_after,
            max_retry_after: config.max_retry_after(),
        }
    }

    /// How long to wait before the next attempt after `error`
    pub fn wait_for<E: RetryableError>(&self, error: &E) -> Duration {
        match error.retry_after() {
            Some(wait) if self.honor_retry_after => wait.min(self.max_retry_after),
            _ => self.delay,
        }
    }

    /// Run `op` until it succeeds, fails fatally, or runs out of attempts
    pub async fn run<T, E, F, Fut>(&self, what: &str, mut op: F) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: RetryableError + Display,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if !e.is_retryable() => return Err(RetryError::Fatal(e)),
                Err(e) if attempt >= max_attempts => {
                    warn!("{} failed after {} attempts: {}", what, attempt, e);
                    return Err(RetryError::Exhausted {
                        attempts: attempt,
                        last: e,
                    });
                }
                Err(e) => {
                    let wait = self.wait_for(&e);
                    warn!(
                        "{} failed ({}), retrying in {:?} (attempt {}/{})",
                        what, e, wait, attempt, max_attempts
                    );
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                }
            }
        }
    }
}
