use std::time::{Duration, Instant};
use tokio::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::error::EngineError;
use crate::metrics::Metrics;

/// Acquire a per-entity lock, giving up after `timeout`.
///
/// Every mutation of an order or a part goes through one of these locks, so
/// the wait here is the only place a caller can block.
pub async fn lock_entity<'a, T>(
    mutex: &'a Mutex<T>,
    resource: &'static str,
    id: Uuid,
    timeout: Duration,
    metrics: &Metrics,
) -> Result<MutexGuard<'a, T>, EngineError> {
    let started = Instant::now();
    match tokio::time::timeout(timeout, mutex.lock()).await {
        Ok(guard) => {
            metrics.observe_lock_wait(resource, started.elapsed().as_secs_f64());
            Ok(guard)
        }
        Err(_) => {
            tracing::warn!(
                resource = resource,
                id = %id,
                timeout_ms = timeout.as_millis() as u64,
                "Lock wait timed out"
            );
            Err(EngineError::LockTimeout { resource, id })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_lock_times_out_while_held() {
        let metrics = Metrics::new().unwrap();
        let mutex = Mutex::new(0u32);
        let _held = mutex.lock().await;

        let result = lock_entity(&mutex, "order", Uuid::new_v4(), Duration::from_millis(20), &metrics).await;
        assert!(matches!(result, Err(EngineError::LockTimeout { resource: "order", .. })));
    }

    #[tokio::test]
    async fn test_lock_acquired_when_free() {
        let metrics = Metrics::new().unwrap();
        let mutex = Mutex::new(7u32);

        let guard = lock_entity(&mutex, "part", Uuid::new_v4(), Duration::from_millis(20), &metrics)
            .await
            .unwrap();
        assert_eq!(*guard, 7);
    }
}
