use std::sync::Arc;

use crate::config::EngineConfig;
use crate::domain::appointment::{AppointmentCommandHandler, AppointmentConverter};
use crate::domain::inventory::InventoryLedger;
use crate::domain::order::OrderCommandHandler;
use crate::messaging::{EffectDispatcher, NotificationDispatcher, Notifier};
use crate::metrics::Metrics;
use crate::registry::{ClientDirectory, VehicleRegistry};

// ============================================================================
// Engine - wires the ledgers to their collaborators
// ============================================================================
//
// The caller supplies the three outside boundaries (vehicles, client
// addresses, message delivery); everything else is built from the config.
//
// ============================================================================

pub struct Engine {
    pub config: EngineConfig,
    pub metrics: Arc<Metrics>,
    pub inventory: Arc<InventoryLedger>,
    pub orders: Arc<OrderCommandHandler>,
    pub appointments: Arc<AppointmentCommandHandler>,
}

impl Engine {
    pub fn new(
        config: EngineConfig,
        vehicles: Arc<dyn VehicleRegistry>,
        clients: Arc<dyn ClientDirectory>,
        notifier: Arc<dyn Notifier>,
    ) -> anyhow::Result<Self> {
        let metrics = Arc::new(Metrics::new()?);

        let notifications = NotificationDispatcher::new(
            notifier,
            config.notify_retry.clone(),
            config.notify_breaker.clone(),
            config.notify_send_timeout,
            metrics.clone(),
        );
        let effects = Arc::new(EffectDispatcher::new(vehicles.clone(), clients, notifications));

        let inventory = Arc::new(InventoryLedger::new(
            config.lock_timeout,
            config.default_min_quantity,
            metrics.clone(),
        ));
        let orders = Arc::new(OrderCommandHandler::new(
            inventory.clone(),
            vehicles,
            effects.clone(),
            metrics.clone(),
            config.lock_timeout,
        ));
        let appointments = Arc::new(AppointmentCommandHandler::new(
            AppointmentConverter::new(orders.clone()),
            effects,
            metrics.clone(),
            config.lock_timeout,
        ));

        tracing::info!(
            lock_timeout_ms = config.lock_timeout.as_millis() as u64,
            default_min_quantity = config.default_min_quantity,
            notify_max_attempts = config.notify_retry.max_attempts,
            "Engine initialized"
        );

        Ok(Self { config, metrics, inventory, orders, appointments })
    }

    /// Prometheus text exposition of every engine metric
    pub fn render_metrics(&self) -> anyhow::Result<String> {
        self.metrics.render()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::inventory::NewInventoryPart;
    use crate::domain::order::{NewTask, TaskStatus};
    use crate::messaging::testing::RecordingNotifier;
    use crate::registry::{
        InMemoryClientDirectory, InMemoryVehicleRegistry, VehicleAvailability, VehicleInfo,
    };
    use rust_decimal::Decimal;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_engine_runs_an_order_end_to_end() {
        let vehicles = Arc::new(InMemoryVehicleRegistry::new());
        let vehicle_id = Uuid::new_v4();
        vehicles.register(VehicleInfo {
            id: vehicle_id,
            brand: "Ford".into(),
            model: "Focus".into(),
            owner_id: None,
            availability: VehicleAvailability::InService,
        });

        let engine = Engine::new(
            EngineConfig::default(),
            vehicles.clone(),
            Arc::new(InMemoryClientDirectory::new()),
            Arc::new(RecordingNotifier::default()),
        )
        .unwrap();

        let part = engine
            .inventory
            .register_part(NewInventoryPart {
                name: "Spark plug".into(),
                serial_number: "SP-4".into(),
                quantity_in_stock: 8,
                min_quantity: None,
                unit_price: Decimal::new(1200, 2),
            })
            .await
            .unwrap();
        assert_eq!(part.min_quantity, 5);

        let order = engine.orders.create_order(vehicle_id, None, "Misfire").await.unwrap();
        engine.orders.attach_part(order.id, part.id, 4).await.unwrap();
        engine
            .orders
            .attach_task(order.id, NewTask::new("Replace plugs", Decimal::new(6000, 2)).with_status(TaskStatus::Done))
            .await
            .unwrap();

        let order = engine.orders.get_order(order.id).await.unwrap();
        assert_eq!(order.total_price, Decimal::new(10800, 2));
        assert_eq!(vehicles.availability(vehicle_id), Some(VehicleAvailability::Available));
        assert!(engine.inventory.get_part(part.id).await.unwrap().is_low_stock());

        let text = engine.render_metrics().unwrap();
        assert!(text.contains("orders_created_total 1"));
        assert!(text.contains("orders_completed_total 1"));
    }
}
