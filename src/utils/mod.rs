pub mod circuit_breaker;
pub mod lock;
pub mod retry;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitBreakerError, CircuitState};
pub use lock::lock_entity;
pub use retry::{retry_on_transient, IsTransient, RetryConfig, RetryResult};
