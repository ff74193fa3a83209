use std::sync::{Arc, OnceLock};
use std::thread;
use std::time::Duration;

use rcm_core::config::RetrySettings;
use rcm_core::error::AppError;
use regex::Regex;

/// Blocking pause. Production code sleeps the thread; tests record the requested durations.
pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            thread::sleep(duration);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_settings(&RetrySettings::default())
    }
}

impl RetryPolicy {
    pub fn from_settings(settings: &RetrySettings) -> Self {
        Self {
            max_retries: settings.max_retries.max(1),
            base_delay: Duration::from_secs(settings.base_delay_secs),
        }
    }

    /// Wait after a rate-limited attempt `attempt` (0-based): `base_delay * 2^attempt`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }
}

/// True when the provider refused the call because of quota or rate limits.
pub fn is_rate_limited(err: &AppError) -> bool {
    static HTTP_429: OnceLock<Option<Regex>> = OnceLock::new();
    if err.code == "AI_RATE_LIMITED" {
        return true;
    }
    let text = err.describe();
    if text.contains("RESOURCE_EXHAUSTED") || text.contains("Too Many Requests") {
        return true;
    }
    HTTP_429
        .get_or_init(|| Regex::new(r"\b429\b").ok())
        .as_ref()
        .is_some_and(|re| re.is_match(&text))
}

/// Wraps every model call: retries rate-limited attempts with exponential backoff and
/// returns any other error immediately. Holds no state between invocations.
#[derive(Clone)]
pub struct ModelInvoker {
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl std::fmt::Debug for ModelInvoker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelInvoker")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl ModelInvoker {
    pub fn new(policy: RetryPolicy, sleeper: Arc<dyn Sleeper>) -> Self {
        Self { policy, sleeper }
    }

    pub fn with_thread_sleeper(policy: RetryPolicy) -> Self {
        Self::new(policy, Arc::new(ThreadSleeper))
    }

    pub fn invoke<T, F>(&self, label: &str, mut call: F) -> Result<T, AppError>
    where
        F: FnMut() -> Result<T, AppError>,
    {
        let max = self.policy.max_retries.max(1);
        let mut attempt = 0u32;
        loop {
            match call() {
                Ok(v) => return Ok(v),
                Err(e) if is_rate_limited(&e) && attempt + 1 < max => {
                    let wait = self.policy.delay_for(attempt);
                    tracing::warn!(
                        call = label,
                        attempt = attempt + 1,
                        max_attempts = max,
                        wait_secs = wait.as_secs_f64(),
                        "rate limited; backing off"
                    );
                    self.sleeper.sleep(wait);
                    attempt += 1;
                }
                Err(e) => {
                    if is_rate_limited(&e) {
                        tracing::warn!(call = label, attempts = max, "rate limit retries exhausted");
                    }
                    return Err(e);
                }
            }
        }
    }

    /// Fixed pause between paced operations (ingest batches, audit rows).
    pub fn pace(&self, duration: Duration) {
        self.sleeper.sleep(duration);
    }
}
