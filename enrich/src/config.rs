//! Configuration for the enrichment engine.

use std::time::Duration;

use rand::random;
use serde::{Deserialize, Serialize};

/// Configuration for enriching a library.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichConfig {
    /// Completion model.
    pub model: String,

    /// API base URL (without `/chat/completions`).
    pub base_url: String,

    /// Sampling temperature.
    pub temperature: f32,

    /// Per-call timeout in seconds.
    pub timeout_secs: u64,

    /// Characters per MAP chunk.
    pub chunk_chars: usize,

    /// Concurrent documents.
    pub workers: usize,

    /// Keep making passes until nothing is left to do.
    pub until_done: bool,

    /// Pass limit when `until_done` is set.
    pub max_passes: usize,

    /// Pause between passes in seconds.
    pub pass_sleep_secs: f64,

    /// Also process notes that already carry a header.
    pub reprocess: bool,

    /// Only process notes whose filename contains this substring.
    pub only: Option<String>,

    /// Exact basenames never processed.
    pub skip_basenames: Vec<String>,

    /// Assets folder excluded from the scan.
    pub assets_subdir: String,

    /// Namespace every tag is placed under.
    pub tag_namespace: String,

    /// Retry policy for provider calls.
    pub retry: RetryPolicy,
}

impl EnrichConfig {
    /// Set the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the API base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the worker count (at least one).
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Set the MAP chunk size.
    pub fn with_chunk_chars(mut self, chunk_chars: usize) -> Self {
        self.chunk_chars = chunk_chars;
        self
    }

    /// Repeat passes until done, at most `max_passes` times.
    pub fn until_done(mut self, max_passes: usize) -> Self {
        self.until_done = true;
        self.max_passes = max_passes.max(1);
        self
    }

    /// Set the pause between passes.
    pub fn with_pass_sleep(mut self, secs: f64) -> Self {
        self.pass_sleep_secs = secs.max(0.0);
        self
    }

    /// Process notes that already have a header.
    pub fn reprocess(mut self) -> Self {
        self.reprocess = true;
        self
    }

    /// Restrict processing to filenames containing `needle`.
    pub fn only(mut self, needle: impl Into<String>) -> Self {
        self.only = Some(needle.into());
        self
    }

    /// Set the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Per-call timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Pause between passes.
    pub fn pass_sleep(&self) -> Duration {
        seconds(self.pass_sleep_secs)
    }
}

impl Default for EnrichConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            temperature: 0.15,
            timeout_secs: 600,
            chunk_chars: 6000,
            workers: 3,
            until_done: false,
            max_passes: 6,
            pass_sleep_secs: 5.0,
            reprocess: false,
            only: None,
            skip_basenames: vec!["dashboard.md".to_string(), "notes.md".to_string()],
            assets_subdir: "_assets".to_string(),
            tag_namespace: "misc".to_string(),
            retry: RetryPolicy::default(),
        }
    }
}

/// Exponential backoff with multiplicative jitter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Attempts including the first call.
    pub max_attempts: u32,

    /// Backoff base in seconds; the delay after attempt `n` is `base^n`.
    pub base_secs: f64,

    /// Jitter factor; delays are stretched by up to this fraction.
    pub jitter: f64,

    /// Upper bound on any single delay in seconds.
    pub max_delay_secs: f64,
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Set the attempt limit (at least one).
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Set the backoff base.
    pub fn with_base(mut self, secs: f64) -> Self {
        self.base_secs = secs;
        self
    }

    /// Set the jitter factor.
    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter.max(0.0);
        self
    }

    /// Delay before the attempt following failed attempt `attempt` (1-based).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base = self.base_secs.max(0.0).powi(attempt as i32);
        let jittered = base * (1.0 + self.jitter * random::<f64>());
        seconds(jittered.min(self.max_delay_secs))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 6,
            base_secs: 2.0,
            jitter: 0.25,
            max_delay_secs: 60.0,
        }
    }
}

/// Seconds as a duration. Negative or NaN is zero; overflow saturates.
fn seconds(secs: f64) -> Duration {
    if secs.is_nan() || secs <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_delay_bounds() {
        let policy = RetryPolicy::default();
        for attempt in 1..=5 {
            let delay = policy.delay_for_attempt(attempt).as_secs_f64();
            let base = 2f64.powi(attempt as i32);
            assert!(delay >= base && delay <= (base * 1.25).min(60.0), "{attempt}: {delay}");
        }
        assert_eq!(policy.delay_for_attempt(10), Duration::from_secs(60));
    }

    #[test]
    fn test_delay_without_jitter_is_exact() {
        let policy = RetryPolicy::default().with_jitter(0.0);
        assert_eq!(policy.delay_for_attempt(3), Duration::from_secs(8));
    }

    #[test]
    fn test_config_from_partial_json() {
        let config: EnrichConfig =
            serde_json::from_str(r#"{"workers": 5, "retry": {"max_attempts": 2}}"#).unwrap();
        assert_eq!(config.workers, 5);
        assert_eq!(config.retry.max_attempts, 2);
        assert_eq!(config.retry.base_secs, 2.0);
        assert_eq!(config.model, "gpt-4o-mini");
    }

    #[test]
    fn test_unbounded_seconds_saturate() {
        let policy = RetryPolicy {
            max_delay_secs: f64::INFINITY,
            ..RetryPolicy::default()
        };
        assert_eq!(policy.delay_for_attempt(2000), Duration::MAX);

        let nan = RetryPolicy {
            base_secs: f64::NAN,
            max_delay_secs: f64::NAN,
            ..RetryPolicy::default()
        };
        nan.delay_for_attempt(3);

        let sleep = |secs: f64| EnrichConfig::default().with_pass_sleep(secs).pass_sleep();
        assert_eq!(sleep(f64::INFINITY), Duration::MAX);
        assert_eq!(sleep(1e300), Duration::MAX);
        assert_eq!(sleep(f64::NAN), Duration::ZERO);
        assert_eq!(sleep(-3.0), Duration::ZERO);
    }
}
