use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::error::EngineError;
use crate::messaging::{EffectDispatcher, Notification};
use crate::metrics::Metrics;
use crate::utils::lock_entity;

use super::converter::AppointmentConverter;
use super::errors::AppointmentError;
use super::value_objects::{Appointment, AppointmentStatus, NewAppointment};

// ============================================================================
// Appointment Command Handler
// ============================================================================
//
// Confirming an appointment opens a service order for it. The conversion runs
// under the appointment's lock and the resulting order id is recorded on the
// appointment, so no appointment ever produces two orders. A failed conversion
// is logged; the status change itself always sticks.
//
// ============================================================================

pub struct AppointmentCommandHandler {
    appointments: DashMap<Uuid, Arc<Mutex<Appointment>>>,
    converter: AppointmentConverter,
    effects: Arc<EffectDispatcher>,
    metrics: Arc<Metrics>,
    lock_timeout: Duration,
}

impl AppointmentCommandHandler {
    pub fn new(
        converter: AppointmentConverter,
        effects: Arc<EffectDispatcher>,
        metrics: Arc<Metrics>,
        lock_timeout: Duration,
    ) -> Self {
        Self {
            appointments: DashMap::new(),
            converter,
            effects,
            metrics,
            lock_timeout,
        }
    }

    fn handle_of(&self, appointment_id: Uuid) -> Result<Arc<Mutex<Appointment>>, AppointmentError> {
        self.appointments
            .get(&appointment_id)
            .map(|entry| entry.value().clone())
            .ok_or(AppointmentError::AppointmentNotFound(appointment_id))
    }

    async fn lock<'a>(
        &self,
        handle: &'a Mutex<Appointment>,
        appointment_id: Uuid,
    ) -> Result<MutexGuard<'a, Appointment>, EngineError> {
        lock_entity(handle, "appointment", appointment_id, self.lock_timeout, &self.metrics).await
    }

    pub async fn request_appointment(
        &self,
        request: NewAppointment,
    ) -> Result<Appointment, EngineError> {
        if request.description.trim().is_empty() {
            return Err(AppointmentError::EmptyDescription.into());
        }

        let appointment = Appointment {
            id: Uuid::new_v4(),
            client_id: request.client_id,
            vehicle_id: request.vehicle_id,
            requested_date: request.requested_date,
            status: AppointmentStatus::Requested,
            description: request.description,
            order_id: None,
        };
        self.appointments
            .insert(appointment.id, Arc::new(Mutex::new(appointment.clone())));

        tracing::info!(
            appointment_id = %appointment.id,
            client_id = %appointment.client_id,
            requested_date = %appointment.requested_date,
            "Appointment requested"
        );
        Ok(appointment)
    }

    pub async fn get_appointment(&self, appointment_id: Uuid) -> Result<Appointment, EngineError> {
        let handle = self.handle_of(appointment_id)?;
        let appointment = self.lock(&handle, appointment_id).await?;
        Ok(appointment.clone())
    }

    /// A client's appointments, earliest first.
    pub async fn appointments_for_client(
        &self,
        client_id: Uuid,
    ) -> Result<Vec<Appointment>, EngineError> {
        let handles: Vec<(Uuid, Arc<Mutex<Appointment>>)> = self
            .appointments
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();

        let mut appointments = Vec::new();
        for (appointment_id, handle) in handles {
            let appointment = self.lock(&handle, appointment_id).await?;
            if appointment.client_id == client_id {
                appointments.push(appointment.clone());
            }
        }

        appointments.sort_by(|a, b| a.requested_date.cmp(&b.requested_date));
        Ok(appointments)
    }

    /// Set the status. Entering Confirmed opens an order (once per appointment)
    /// and tells the client.
    pub async fn update_appointment_status(
        &self,
        appointment_id: Uuid,
        status: AppointmentStatus,
    ) -> Result<Appointment, EngineError> {
        let handle = self.handle_of(appointment_id)?;

        let (appointment, confirmed) = {
            let mut appointment = self.lock(&handle, appointment_id).await?;
            let confirmed = status == AppointmentStatus::Confirmed
                && appointment.status != AppointmentStatus::Confirmed;
            let previous = appointment.status;
            appointment.status = status;

            if confirmed && appointment.order_id.is_none() {
                match self.converter.convert(&appointment).await {
                    Ok(order) => appointment.order_id = Some(order.id),
                    Err(e) => tracing::warn!(
                        appointment_id = %appointment_id,
                        error = %e,
                        "Failed to create order from appointment"
                    ),
                }
            }

            tracing::info!(
                appointment_id = %appointment_id,
                from = %previous,
                to = %status,
                "Appointment status updated"
            );
            (appointment.clone(), confirmed)
        };

        if confirmed {
            self.effects
                .notify_client(
                    appointment.client_id,
                    &Notification::AppointmentConfirmed { appointment_id },
                )
                .await;
        }

        Ok(appointment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::inventory::InventoryLedger;
    use crate::domain::order::{OrderCommandHandler, OrderFilter, OrderStatus};
    use crate::error::ErrorKind;
    use crate::messaging::testing::RecordingNotifier;
    use crate::messaging::NotificationDispatcher;
    use crate::registry::{
        InMemoryClientDirectory, InMemoryVehicleRegistry, VehicleAvailability, VehicleInfo,
    };
    use crate::utils::{CircuitBreakerConfig, RetryConfig};
    use chrono::{TimeZone, Utc};

    struct Fixture {
        appointments: AppointmentCommandHandler,
        orders: Arc<OrderCommandHandler>,
        notifier: Arc<RecordingNotifier>,
        client_id: Uuid,
        vehicle_id: Uuid,
    }

    fn fixture() -> Fixture {
        let metrics = Arc::new(Metrics::new().unwrap());
        let lock_timeout = Duration::from_secs(5);
        let notifier = Arc::new(RecordingNotifier::default());

        let vehicles = Arc::new(InMemoryVehicleRegistry::new());
        let clients = Arc::new(InMemoryClientDirectory::new());
        let client_id = Uuid::new_v4();
        let vehicle_id = Uuid::new_v4();
        vehicles.register(VehicleInfo {
            id: vehicle_id,
            brand: "Volvo".into(),
            model: "V70".into(),
            owner_id: Some(client_id),
            availability: VehicleAvailability::Waiting,
        });
        clients.link(client_id, "chat-7");

        let notifications = NotificationDispatcher::new(
            notifier.clone(),
            RetryConfig::default(),
            CircuitBreakerConfig::default(),
            Duration::from_millis(100),
            metrics.clone(),
        );
        let effects = Arc::new(EffectDispatcher::new(vehicles.clone(), clients, notifications));
        let inventory = Arc::new(InventoryLedger::new(lock_timeout, 5, metrics.clone()));
        let orders = Arc::new(OrderCommandHandler::new(
            inventory,
            vehicles,
            effects.clone(),
            metrics.clone(),
            lock_timeout,
        ));

        let appointments = AppointmentCommandHandler::new(
            AppointmentConverter::new(orders.clone()),
            effects,
            metrics,
            lock_timeout,
        );

        Fixture { appointments, orders, notifier, client_id, vehicle_id }
    }

    fn request(f: &Fixture, vehicle_id: Option<Uuid>) -> NewAppointment {
        NewAppointment {
            client_id: f.client_id,
            vehicle_id,
            requested_date: Utc.with_ymd_and_hms(2026, 11, 3, 8, 0, 0).unwrap(),
            description: "Winter tyre swap".into(),
        }
    }

    #[tokio::test]
    async fn test_confirming_creates_exactly_one_order() {
        let f = fixture();
        let booking = request(&f, Some(f.vehicle_id));
        let appointment = f.appointments.request_appointment(booking).await.unwrap();
        assert_eq!(appointment.status, AppointmentStatus::Requested);

        let confirmed = f
            .appointments
            .update_appointment_status(appointment.id, AppointmentStatus::Confirmed)
            .await
            .unwrap();
        let order_id = confirmed.order_id.unwrap();

        let order = f.orders.get_order(order_id).await.unwrap();
        assert_eq!(order.status, OrderStatus::New);
        assert_eq!(order.vehicle_id, f.vehicle_id);
        assert!(order.mechanic_id.is_none());
        assert!(order.description.contains("2026-11-03"));
        assert!(order.description.contains("Winter tyre swap"));

        // confirming again, or after a detour through another status, reuses the order
        f.appointments
            .update_appointment_status(appointment.id, AppointmentStatus::Confirmed)
            .await
            .unwrap();
        f.appointments
            .update_appointment_status(appointment.id, AppointmentStatus::Requested)
            .await
            .unwrap();
        let reconfirmed = f
            .appointments
            .update_appointment_status(appointment.id, AppointmentStatus::Confirmed)
            .await
            .unwrap();

        assert_eq!(reconfirmed.order_id, Some(order_id));
        assert_eq!(f.orders.list_orders(&OrderFilter::default()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_confirmation_notifies_client() {
        let f = fixture();
        let booking = request(&f, Some(f.vehicle_id));
        let appointment = f.appointments.request_appointment(booking).await.unwrap();

        f.appointments
            .update_appointment_status(appointment.id, AppointmentStatus::Confirmed)
            .await
            .unwrap();

        let sent = f.notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "chat-7");
        assert!(sent[0].1.contains(&appointment.id.to_string()));
        assert!(sent[0].1.contains(AppointmentStatus::Confirmed.label()));
    }

    #[tokio::test]
    async fn test_missing_vehicle_keeps_status_change() {
        let f = fixture();
        let appointment = f.appointments.request_appointment(request(&f, None)).await.unwrap();

        let confirmed = f
            .appointments
            .update_appointment_status(appointment.id, AppointmentStatus::Confirmed)
            .await
            .unwrap();

        assert_eq!(confirmed.status, AppointmentStatus::Confirmed);
        assert!(confirmed.order_id.is_none());
        assert!(f.orders.list_orders(&OrderFilter::default()).await.unwrap().is_empty());
        assert_eq!(
            f.appointments.get_appointment(appointment.id).await.unwrap().status,
            AppointmentStatus::Confirmed
        );
    }

    #[tokio::test]
    async fn test_rejection_creates_no_order() {
        let f = fixture();
        let booking = request(&f, Some(f.vehicle_id));
        let appointment = f.appointments.request_appointment(booking).await.unwrap();

        let rejected = f
            .appointments
            .update_appointment_status(appointment.id, AppointmentStatus::Rejected)
            .await
            .unwrap();

        assert_eq!(rejected.status, AppointmentStatus::Rejected);
        assert!(rejected.order_id.is_none());
        assert!(f.notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn test_appointments_for_client() {
        let f = fixture();
        let mut later = request(&f, Some(f.vehicle_id));
        later.requested_date = Utc.with_ymd_and_hms(2026, 12, 1, 8, 0, 0).unwrap();
        f.appointments.request_appointment(later).await.unwrap();
        f.appointments.request_appointment(request(&f, None)).await.unwrap();
        f.appointments
            .request_appointment(NewAppointment {
                client_id: Uuid::new_v4(),
                ..request(&f, None)
            })
            .await
            .unwrap();

        let mine = f.appointments.appointments_for_client(f.client_id).await.unwrap();

        assert_eq!(mine.len(), 2);
        assert!(mine[0].requested_date < mine[1].requested_date);
    }

    #[tokio::test]
    async fn test_rejects_blank_description_and_unknown_id() {
        let f = fixture();
        let blank = NewAppointment { description: "  ".into(), ..request(&f, None) };
        let err = f.appointments.request_appointment(blank).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        let err = f
            .appointments
            .update_appointment_status(Uuid::new_v4(), AppointmentStatus::Confirmed)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
