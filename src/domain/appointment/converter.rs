use std::sync::Arc;

use crate::domain::order::{OrderAggregate, OrderCommandHandler};
use crate::error::EngineError;
use super::errors::AppointmentError;
use super::value_objects::Appointment;

/// Turns a confirmed appointment into a new service order.
pub struct AppointmentConverter {
    orders: Arc<OrderCommandHandler>,
}

impl AppointmentConverter {
    pub fn new(orders: Arc<OrderCommandHandler>) -> Self {
        Self { orders }
    }

    pub fn order_description(appointment: &Appointment) -> String {
        format!(
            "Appointment on {}: {}",
            appointment.requested_date.date_naive(),
            appointment.description
        )
    }

    /// New order for the appointment's vehicle, unassigned and in status New.
    pub async fn convert(&self, appointment: &Appointment) -> Result<OrderAggregate, EngineError> {
        let vehicle_id = appointment
            .vehicle_id
            .ok_or(AppointmentError::MissingVehicle(appointment.id))?;

        let order = self
            .orders
            .create_order(vehicle_id, None, Self::order_description(appointment))
            .await?;

        tracing::info!(
            appointment_id = %appointment.id,
            order_id = %order.id,
            vehicle_id = %vehicle_id,
            "Converted appointment into order"
        );
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::appointment::AppointmentStatus;
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    #[test]
    fn test_description_carries_date_and_text() {
        let appointment = Appointment {
            id: Uuid::new_v4(),
            client_id: Uuid::new_v4(),
            vehicle_id: Some(Uuid::new_v4()),
            requested_date: Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 0).unwrap(),
            status: AppointmentStatus::Confirmed,
            description: "Annual inspection and filter change".into(),
            order_id: None,
        };

        assert_eq!(
            AppointmentConverter::order_description(&appointment),
            "Appointment on 2026-03-14: Annual inspection and filter change"
        );
    }
}
