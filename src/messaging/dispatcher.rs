use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::domain::order::SideEffect;
use crate::metrics::Metrics;
use crate::registry::{ClientDirectory, VehicleRegistry};
use crate::utils::{
    retry_on_transient, CircuitBreaker, CircuitBreakerConfig, CircuitBreakerError, RetryConfig,
    RetryResult,
};
use super::notification::Notification;
use super::notifier::{Notifier, NotifierError};

// ============================================================================
// Notification Dispatcher
// ============================================================================
//
// Best-effort delivery. Each attempt gets `send_timeout`; a send that does not
// answer in time counts as a transient failure. Transient failures are retried
// with backoff and repeated failures open a circuit. Whatever still fails is
// logged and dropped.
//
// ============================================================================

pub struct NotificationDispatcher {
    notifier: Arc<dyn Notifier>,
    breaker: CircuitBreaker,
    retry: RetryConfig,
    send_timeout: Duration,
    metrics: Arc<Metrics>,
}

impl NotificationDispatcher {
    pub fn new(
        notifier: Arc<dyn Notifier>,
        retry: RetryConfig,
        breaker: CircuitBreakerConfig,
        send_timeout: Duration,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            notifier,
            breaker: CircuitBreaker::new(breaker),
            retry,
            send_timeout,
            metrics,
        }
    }

    async fn send_once(&self, address: &str, text: &str) -> Result<(), NotifierError> {
        let attempt = self.notifier.send_message(address, text);
        match tokio::time::timeout(self.send_timeout, attempt).await {
            Ok(result) => result,
            Err(_) => Err(NotifierError::Unavailable(format!(
                "no answer within {}ms",
                self.send_timeout.as_millis()
            ))),
        }
    }

    /// Deliver `text` to `address`. Never fails.
    pub async fn deliver(&self, address: &str, text: &str, kind: &str) {
        let result = self
            .breaker
            .call(async {
                let outcome =
                    retry_on_transient(&self.retry, |_attempt| self.send_once(address, text)).await;
                match outcome {
                    RetryResult::Success(()) => Ok(()),
                    RetryResult::Failed(e) | RetryResult::PermanentFailure(e) => Err(e),
                }
            })
            .await;

        self.metrics
            .update_notifier_circuit_state(self.breaker.state().await.as_gauge());

        match result {
            Ok(()) => {
                self.metrics.record_notification(kind, "delivered");
                tracing::debug!(address = %address, kind = kind, "Notification delivered");
            }
            Err(CircuitBreakerError::CircuitOpen) => {
                self.metrics.record_notification(kind, "circuit_open");
                tracing::warn!(address = %address, kind = kind, "Notifier circuit open, dropping notification");
            }
            Err(CircuitBreakerError::OperationFailed(e)) => {
                let outcome = match e {
                    NotifierError::Unavailable(_) => "unavailable",
                    NotifierError::Rejected { .. } => "rejected",
                };
                self.metrics.record_notification(kind, outcome);
                tracing::warn!(address = %address, kind = kind, error = %e, "Failed to deliver notification");
            }
        }
    }
}

// ============================================================================
// Effect Dispatcher
// ============================================================================
//
// Runs the side effects an order transition produced, in order, after the
// transition has been committed. Nothing here can fail the transition.
//
// ============================================================================

pub struct EffectDispatcher {
    vehicles: Arc<dyn VehicleRegistry>,
    clients: Arc<dyn ClientDirectory>,
    notifications: NotificationDispatcher,
}

impl EffectDispatcher {
    pub fn new(
        vehicles: Arc<dyn VehicleRegistry>,
        clients: Arc<dyn ClientDirectory>,
        notifications: NotificationDispatcher,
    ) -> Self {
        Self { vehicles, clients, notifications }
    }

    pub async fn apply(&self, effects: Vec<SideEffect>) {
        for effect in effects {
            match effect {
                SideEffect::SetVehicleAvailability { vehicle_id, availability } => {
                    match self.vehicles.set_availability(vehicle_id, availability).await {
                        Ok(()) => tracing::info!(
                            vehicle_id = %vehicle_id,
                            availability = ?availability,
                            "Vehicle availability updated"
                        ),
                        Err(e) => tracing::warn!(
                            vehicle_id = %vehicle_id,
                            error = %e,
                            "Failed to update vehicle availability"
                        ),
                    }
                }
                SideEffect::NotifyVehicleOwner { vehicle_id, notification } => {
                    self.notify_vehicle_owner(vehicle_id, &notification).await;
                }
            }
        }
    }

    async fn notify_vehicle_owner(&self, vehicle_id: Uuid, notification: &Notification) {
        let vehicle = match self.vehicles.vehicle(vehicle_id).await {
            Ok(vehicle) => vehicle,
            Err(e) => {
                tracing::warn!(vehicle_id = %vehicle_id, error = %e, "Vehicle lookup failed");
                None
            }
        };

        let Some(owner_id) = vehicle.as_ref().and_then(|v| v.owner_id) else {
            tracing::debug!(vehicle_id = %vehicle_id, "Vehicle has no owner on file, skipping notification");
            return;
        };

        let Some(address) = self.clients.notification_address(owner_id).await else {
            tracing::debug!(client_id = %owner_id, "No notification address on file");
            return;
        };

        let text = notification.render(vehicle.as_ref());
        self.notifications.deliver(&address, &text, notification.kind()).await;
    }

    pub async fn notify_client(&self, client_id: Uuid, notification: &Notification) {
        let Some(address) = self.clients.notification_address(client_id).await else {
            tracing::debug!(client_id = %client_id, "No notification address on file");
            return;
        };

        let text = notification.render(None);
        self.notifications.deliver(&address, &text, notification.kind()).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messaging::testing::{FailingNotifier, HangingNotifier, RecordingNotifier};
    use crate::registry::{
        InMemoryClientDirectory, InMemoryVehicleRegistry, VehicleAvailability, VehicleInfo,
    };

    fn fast_retry() -> RetryConfig {
        RetryConfig {
            max_attempts: 2,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
            multiplier: 2.0,
        }
    }

    fn setup(notifier: Arc<dyn Notifier>) -> (EffectDispatcher, Arc<InMemoryVehicleRegistry>, Uuid) {
        let vehicles = Arc::new(InMemoryVehicleRegistry::new());
        let clients = Arc::new(InMemoryClientDirectory::new());
        let owner_id = Uuid::new_v4();
        let vehicle_id = Uuid::new_v4();
        vehicles.register(VehicleInfo {
            id: vehicle_id,
            brand: "Audi".into(),
            model: "A4".into(),
            owner_id: Some(owner_id),
            availability: VehicleAvailability::InService,
        });
        clients.link(owner_id, "chat-100");

        let notifications = NotificationDispatcher::new(
            notifier,
            fast_retry(),
            CircuitBreakerConfig { failure_threshold: 2, open_timeout: Duration::from_secs(60) },
            Duration::from_millis(50),
            Arc::new(Metrics::new().unwrap()),
        );
        (EffectDispatcher::new(vehicles.clone(), clients, notifications), vehicles, vehicle_id)
    }

    #[tokio::test]
    async fn test_effects_applied_in_order() {
        let notifier = Arc::new(RecordingNotifier::default());
        let (dispatcher, vehicles, vehicle_id) = setup(notifier.clone());
        let order_id = Uuid::new_v4();

        dispatcher
            .apply(vec![
                SideEffect::SetVehicleAvailability {
                    vehicle_id,
                    availability: VehicleAvailability::Available,
                },
                SideEffect::NotifyVehicleOwner {
                    vehicle_id,
                    notification: Notification::OrderFinished { order_id },
                },
            ])
            .await;

        assert_eq!(vehicles.availability(vehicle_id), Some(VehicleAvailability::Available));
        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "chat-100");
        assert!(sent[0].1.contains("Audi A4"));
    }

    #[tokio::test]
    async fn test_failing_notifier_is_swallowed_and_circuit_opens() {
        let notifier = Arc::new(FailingNotifier::default());
        let (dispatcher, vehicles, vehicle_id) = setup(notifier.clone());

        for _ in 0..3 {
            dispatcher
                .apply(vec![
                    SideEffect::NotifyVehicleOwner {
                        vehicle_id,
                        notification: Notification::OrderFinished { order_id: Uuid::new_v4() },
                    },
                    SideEffect::SetVehicleAvailability {
                        vehicle_id,
                        availability: VehicleAvailability::Available,
                    },
                ])
                .await;
        }

        // two dispatches with two attempts each, the third is refused by the open circuit
        assert_eq!(notifier.attempts(), 4);
        assert_eq!(vehicles.availability(vehicle_id), Some(VehicleAvailability::Available));
    }

    #[tokio::test]
    async fn test_silent_notifier_times_out_and_is_retried() {
        let notifier = Arc::new(HangingNotifier::default());
        let (dispatcher, _vehicles, vehicle_id) = setup(notifier.clone());

        let finished = tokio::time::timeout(
            Duration::from_secs(2),
            dispatcher.apply(vec![SideEffect::NotifyVehicleOwner {
                vehicle_id,
                notification: Notification::OrderFinished { order_id: Uuid::new_v4() },
            }]),
        )
        .await;

        assert!(finished.is_ok());
        assert_eq!(notifier.attempts(), 2);
    }

    #[tokio::test]
    async fn test_unknown_vehicle_skips_notification() {
        let notifier = Arc::new(RecordingNotifier::default());
        let (dispatcher, _vehicles, _vehicle_id) = setup(notifier.clone());

        dispatcher
            .apply(vec![SideEffect::NotifyVehicleOwner {
                vehicle_id: Uuid::new_v4(),
                notification: Notification::OrderFinished { order_id: Uuid::new_v4() },
            }])
            .await;

        assert!(notifier.sent().is_empty());
    }
}
