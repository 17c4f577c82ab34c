//! Configuration for a reading machine.

use std::time::Duration;

use tarot_core::Locale;

/// Default upper bound on a single engine call.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(120);

/// Configuration for a [`crate::ReadingMachine`].
#[derive(Debug, Clone)]
pub struct ReadingConfig {
    /// RNG seed for reproducible shuffles. `None` draws from OS entropy.
    pub seed: Option<u64>,
    /// Initial display locale.
    pub locale: Locale,
    /// Upper bound on each engine call; an elapsed call counts as a failure.
    pub call_timeout: Duration,
}

impl Default for ReadingConfig {
    fn default() -> Self {
        Self {
            seed: None,
            locale: Locale::default(),
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }
}

impl ReadingConfig {
    /// Set the RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the display locale.
    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    /// Set the per-call timeout. Zero is raised to one millisecond.
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout.max(Duration::from_millis(1));
        self
    }
}
