//! Retrying provider calls with exponential backoff.
//!
//! Each call runs through an explicit state machine:
//!
//! ```text
//! Pending ──► InFlight ──► Done
//!                │  ▲
//!                ▼  │
//!              Backoff ──► (attempts exhausted) Failed
//! ```
//!
//! Only transient errors lead to `Backoff`; anything else fails immediately.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use crate::config::RetryPolicy;
use crate::error::{EnrichError, Result};

/// State of one retried call.
#[derive(Debug)]
pub enum CallState<T> {
    /// Not started.
    Pending,

    /// Attempt `attempt` (1-based) is running.
    InFlight { attempt: u32 },

    /// Waiting `delay` after failed attempt `attempt`.
    Backoff { attempt: u32, delay: Duration },

    /// Finished with a value.
    Done(T),

    /// Finished with an error.
    Failed(EnrichError),
}

/// Result of a retried call with its attempt history.
#[derive(Debug)]
pub struct RetryOutcome<T> {
    /// Final result.
    pub result: Result<T>,

    /// Attempts made.
    pub attempts: u32,

    /// Backoff delays slept between attempts, in order.
    pub delays: Vec<Duration>,
}

impl<T> RetryOutcome<T> {
    /// Drop the history and keep the result.
    pub fn into_result(self) -> Result<T> {
        self.result
    }
}

/// Run `call` until it succeeds, fails permanently, or the policy's attempts
/// are used up.
pub async fn retry_call<T, F, Fut>(policy: &RetryPolicy, mut call: F) -> RetryOutcome<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut state = CallState::Pending;
    let mut attempts = 0;
    let mut delays = Vec::new();

    loop {
        state = match state {
            CallState::Pending => CallState::InFlight { attempt: 1 },
            CallState::InFlight { attempt } => {
                attempts = attempt;
                match call().await {
                    Ok(value) => CallState::Done(value),
                    Err(err) if err.is_transient() && attempt < max_attempts => {
                        let delay = policy.delay_for_attempt(attempt);
                        warn!(
                            "Attempt {attempt}/{max_attempts} failed ({err}), retrying in {:.1}s",
                            delay.as_secs_f64()
                        );
                        CallState::Backoff { attempt, delay }
                    }
                    Err(err) => CallState::Failed(err),
                }
            }
            CallState::Backoff { attempt, delay } => {
                tokio::time::sleep(delay).await;
                delays.push(delay);
                CallState::InFlight {
                    attempt: attempt + 1,
                }
            }
            CallState::Done(value) => {
                debug!("Call succeeded after {attempts} attempt(s)");
                return RetryOutcome {
                    result: Ok(value),
                    attempts,
                    delays,
                };
            }
            CallState::Failed(err) => {
                return RetryOutcome {
                    result: Err(err),
                    attempts,
                    delays,
                };
            }
        }
    }
}
