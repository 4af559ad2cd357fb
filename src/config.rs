use std::time::Duration;

use crate::utils::{CircuitBreakerConfig, RetryConfig};

/// Engine configuration.
///
/// # Environment variables
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | LOCK_TIMEOUT_MS | 5000 | max wait for an order/part lock |
/// | DEFAULT_MIN_QUANTITY | 5 | reorder threshold for parts registered without one |
/// | NOTIFY_MAX_ATTEMPTS | 3 | notifier attempts for transient failures |
/// | NOTIFY_INITIAL_DELAY_MS | 100 | first retry delay |
/// | NOTIFY_MAX_DELAY_MS | 2000 | retry delay ceiling |
/// | NOTIFY_FAILURE_THRESHOLD | 5 | failures before the notifier circuit opens |
/// | NOTIFY_OPEN_TIMEOUT_SECS | 30 | how long the notifier circuit stays open |
/// | NOTIFY_SEND_TIMEOUT_MS | 5000 | max wait for a single notifier attempt |
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub lock_timeout: Duration,
    pub default_min_quantity: u32,
    pub notify_retry: RetryConfig,
    pub notify_breaker: CircuitBreakerConfig,
    pub notify_send_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lock_timeout: Duration::from_millis(5000),
            default_min_quantity: 5,
            notify_retry: RetryConfig::default(),
            notify_breaker: CircuitBreakerConfig::default(),
            notify_send_timeout: Duration::from_millis(5000),
        }
    }
}

impl EngineConfig {
    /// Load from the environment, falling back to defaults for anything unset
    /// or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            lock_timeout: Duration::from_millis(
                env_or("LOCK_TIMEOUT_MS", defaults.lock_timeout.as_millis() as u64),
            ),
            default_min_quantity: env_or("DEFAULT_MIN_QUANTITY", defaults.default_min_quantity),
            notify_retry: RetryConfig {
                max_attempts: env_or("NOTIFY_MAX_ATTEMPTS", defaults.notify_retry.max_attempts).max(1),
                initial_delay: Duration::from_millis(env_or(
                    "NOTIFY_INITIAL_DELAY_MS",
                    defaults.notify_retry.initial_delay.as_millis() as u64,
                )),
                max_delay: Duration::from_millis(env_or(
                    "NOTIFY_MAX_DELAY_MS",
                    defaults.notify_retry.max_delay.as_millis() as u64,
                )),
                multiplier: defaults.notify_retry.multiplier,
            },
            notify_breaker: CircuitBreakerConfig {
                failure_threshold: env_or(
                    "NOTIFY_FAILURE_THRESHOLD",
                    defaults.notify_breaker.failure_threshold,
                )
                .max(1),
                open_timeout: Duration::from_secs(env_or(
                    "NOTIFY_OPEN_TIMEOUT_SECS",
                    defaults.notify_breaker.open_timeout.as_secs(),
                )),
            },
            notify_send_timeout: Duration::from_millis(env_or(
                "NOTIFY_SEND_TIMEOUT_MS",
                defaults.notify_send_timeout.as_millis() as u64,
            )),
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
