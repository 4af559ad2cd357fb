use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::appointment::AppointmentStatus;
use crate::domain::order::OrderStatus;
use crate::registry::VehicleInfo;

/// A message the workshop owes a customer, rendered at delivery time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Notification {
    OrderFinished { order_id: Uuid },
    OrderStatusChanged { order_id: Uuid, status: OrderStatus },
    AppointmentConfirmed { appointment_id: Uuid },
}

impl Notification {
    pub fn render(&self, vehicle: Option<&VehicleInfo>) -> String {
        let vehicle_name = vehicle
            .map(VehicleInfo::display_name)
            .unwrap_or_else(|| "your vehicle".to_string());

        match self {
            Notification::OrderFinished { order_id } => format!(
                "✅ Order #{} completed!\nVehicle: {}\nAll repairs are done. Your vehicle is ready for pickup.",
                order_id, vehicle_name
            ),
            Notification::OrderStatusChanged { order_id, status } => format!(
                "🔧 Order #{} update\nVehicle: {}\nNew status: {}",
                order_id,
                vehicle_name,
                status.label()
            ),
            Notification::AppointmentConfirmed { appointment_id } => format!(
                "📅 Appointment #{} update\nStatus: {}\nThe workshop has confirmed your visit.",
                appointment_id,
                AppointmentStatus::Confirmed.label()
            ),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Notification::OrderFinished { .. } => "order_finished",
            Notification::OrderStatusChanged { .. } => "order_status_changed",
            Notification::AppointmentConfirmed { .. } => "appointment_confirmed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::VehicleAvailability;

    #[test]
    fn test_status_change_renders_label_and_vehicle() {
        let vehicle = VehicleInfo {
            id: Uuid::new_v4(),
            brand: "Toyota".into(),
            model: "Corolla".into(),
            owner_id: None,
            availability: VehicleAvailability::InService,
        };
        let text = Notification::OrderStatusChanged {
            order_id: Uuid::new_v4(),
            status: OrderStatus::WaitingParts,
        }
        .render(Some(&vehicle));

        assert!(text.contains("Toyota Corolla"));
        assert!(text.contains("Waiting for parts"));
    }

    #[test]
    fn test_appointment_confirmation_renders_label() {
        let appointment_id = Uuid::new_v4();
        let text = Notification::AppointmentConfirmed { appointment_id }.render(None);
        assert!(text.contains(&appointment_id.to_string()));
        assert!(text.contains(AppointmentStatus::Confirmed.label()));
    }

    #[test]
    fn test_render_without_vehicle() {
        let order_id = Uuid::new_v4();
        let text = Notification::OrderFinished { order_id }.render(None);
        assert!(text.contains(&order_id.to_string()));
        assert!(text.contains("your vehicle"));
    }
}
