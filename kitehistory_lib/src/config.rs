//! Pacing and retry settings for the chunk fetcher.

use std::time::Duration;

use rand::Rng;

/// How the fetcher spaces and retries adapter calls.
#[derive(Debug, Clone, PartialEq)]
pub struct FetcherConfig {
    /// Minimum wait between two consecutive adapter calls.
    pub call_delay: Duration,
    /// Extra attempts for a chunk after a retryable failure.
    pub max_retries: u32,
    pub base_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            call_delay: Duration::from_millis(1000),
            max_retries: 2,
            base_backoff: Duration::from_millis(2000),
            max_backoff: Duration::from_millis(30_000),
        }
    }
}

impl FetcherConfig {
    /// Defaults, overridden by `KITEHISTORY_CALL_DELAY_MS`, `KITEHISTORY_RETRY_MAX`,
    /// `KITEHISTORY_RETRY_BASE_MS` and `KITEHISTORY_RETRY_MAX_MS`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            call_delay: Duration::from_millis(env_u64(
                "KITEHISTORY_CALL_DELAY_MS",
                defaults.call_delay.as_millis() as u64,
            )),
            max_retries: env_u32("KITEHISTORY_RETRY_MAX", defaults.max_retries),
            base_backoff: Duration::from_millis(env_u64(
                "KITEHISTORY_RETRY_BASE_MS",
                defaults.base_backoff.as_millis() as u64,
            )),
            max_backoff: Duration::from_millis(env_u64(
                "KITEHISTORY_RETRY_MAX_MS",
                defaults.max_backoff.as_millis() as u64,
            )),
        }
    }

    /// No pacing and no retries. Used by tests and dry runs.
    pub fn immediate() -> Self {
        Self {
            call_delay: Duration::ZERO,
            max_retries: 0,
            base_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
        }
    }

    /// Exponential backoff for the given retry attempt (1-based), capped at
    /// `max_backoff`, with ±20% jitter.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(30);
        let exp = 1u64 << shift;
        let base = (self.base_backoff.as_millis() as u64)
            .saturating_mul(exp)
            .min(self.max_backoff.as_millis() as u64);
        let jitter = rand::thread_rng().gen_range(0.8..1.2);
        Duration::from_millis((base as f64 * jitter) as u64)
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|val| val.parse::<u64>().ok())
        .unwrap_or(default)
}

fn env_u32(key: &str, default: u32) -> u32 {
    std::env::var(key)
        .ok()
        .and_then(|val| val.parse::<u32>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = FetcherConfig::default();
        assert_eq!(cfg.call_delay, Duration::from_secs(1));
        assert_eq!(cfg.max_retries, 2);
    }

    #[test]
    fn backoff_doubles_within_jitter() {
        let cfg = FetcherConfig {
            base_backoff: Duration::from_millis(1000),
            max_backoff: Duration::from_millis(60_000),
            ..FetcherConfig::default()
        };
        let first = cfg.delay_for_attempt(1).as_millis();
        assert!((800..1200).contains(&first), "got {first}");
        let third = cfg.delay_for_attempt(3).as_millis();
        assert!((3200..4800).contains(&third), "got {third}");
    }

    #[test]
    fn backoff_is_capped() {
        let cfg = FetcherConfig {
            base_backoff: Duration::from_millis(1000),
            max_backoff: Duration::from_millis(5000),
            ..FetcherConfig::default()
        };
        let late = cfg.delay_for_attempt(20).as_millis();
        assert!(late < 6000, "got {late}");
    }

    #[test]
    fn immediate_has_no_waits() {
        let cfg = FetcherConfig::immediate();
        assert_eq!(cfg.call_delay, Duration::ZERO);
        assert_eq!(cfg.delay_for_attempt(1), Duration::ZERO);
    }

    #[test]
    fn env_parsing_falls_back_on_garbage() {
        std::env::set_var("KITEHISTORY_TEST_NON_NUMERIC", "abc");
        assert_eq!(env_u64("KITEHISTORY_TEST_NON_NUMERIC", 7), 7);
        assert_eq!(env_u32("KITEHISTORY_TEST_NON_NUMERIC", 3), 3);

        std::env::set_var("KITEHISTORY_TEST_NEGATIVE", "-5");
        assert_eq!(env_u64("KITEHISTORY_TEST_NEGATIVE", 7), 7);
        assert_eq!(env_u32("KITEHISTORY_TEST_NEGATIVE", 3), 3);
    }

    #[test]
    fn env_parsing_falls_back_when_unset() {
        assert_eq!(env_u64("KITEHISTORY_TEST_UNSET_VARIABLE", 7), 7);
        assert_eq!(env_u32("KITEHISTORY_TEST_UNSET_VARIABLE", 3), 3);
    }

    #[test]
    fn env_parsing_reads_numbers() {
        std::env::set_var("KITEHISTORY_TEST_NUMERIC", "42");
        assert_eq!(env_u64("KITEHISTORY_TEST_NUMERIC", 7), 42);
        assert_eq!(env_u32("KITEHISTORY_TEST_NUMERIC", 3), 42);
    }
}
