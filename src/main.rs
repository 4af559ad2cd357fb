use std::sync::Arc;

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use uuid::Uuid;

use garage_orders::domain::appointment::{AppointmentStatus, NewAppointment};
use garage_orders::domain::inventory::NewInventoryPart;
use garage_orders::domain::order::{NewTask, TaskStatus, TaskUpdate};
use garage_orders::messaging::LogNotifier;
use garage_orders::registry::{
    InMemoryClientDirectory, InMemoryVehicleRegistry, VehicleAvailability, VehicleInfo,
};
use garage_orders::{Engine, EngineConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Default to INFO, override with RUST_LOG
    // Example: RUST_LOG=debug cargo run
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,garage_orders=debug")),
        )
        .init();

    tracing::info!("🚀 Starting workshop order engine demo");

    // === 1. Collaborators: vehicles, client addresses, message delivery ===
    let vehicles = Arc::new(InMemoryVehicleRegistry::new());
    let clients = Arc::new(InMemoryClientDirectory::new());

    let owner_id = Uuid::new_v4();
    let vehicle_id = Uuid::new_v4();
    vehicles.register(VehicleInfo {
        id: vehicle_id,
        brand: "Toyota".into(),
        model: "Corolla".into(),
        owner_id: Some(owner_id),
        availability: VehicleAvailability::Waiting,
    });
    clients.link(owner_id, "chat-1001");

    let config = EngineConfig::from_env();
    let engine = Engine::new(config, vehicles.clone(), clients, Arc::new(LogNotifier))?;

    // === 2. Stock the shelves ===
    let filter = engine
        .inventory
        .register_part(NewInventoryPart {
            name: "Oil filter".into(),
            serial_number: "OF-2231".into(),
            quantity_in_stock: 12,
            min_quantity: Some(4),
            unit_price: Decimal::new(4500, 2),
        })
        .await?;

    // === 3. A client books a visit, the workshop confirms it ===
    let appointment = engine
        .appointments
        .request_appointment(NewAppointment {
            client_id: owner_id,
            vehicle_id: Some(vehicle_id),
            requested_date: Utc::now() + Duration::days(2),
            description: "Oil change and suspension check".into(),
        })
        .await?;
    let appointment = engine
        .appointments
        .update_appointment_status(appointment.id, AppointmentStatus::Confirmed)
        .await?;

    let Some(order_id) = appointment.order_id else {
        anyhow::bail!("Appointment {} was confirmed without an order", appointment.id);
    };

    // === 4. Work the order ===
    let check = engine
        .orders
        .attach_task(order_id, NewTask::new("Suspension check", Decimal::new(5000, 2)))
        .await?;
    engine
        .orders
        .attach_task(
            order_id,
            NewTask::new("Oil change", Decimal::new(10000, 2)).with_status(TaskStatus::Done),
        )
        .await?;
    engine.orders.attach_part(order_id, filter.id, 1).await?;

    let order = engine.orders.get_order(order_id).await?;
    tracing::info!(
        order_id = %order.id,
        status = %order.status,
        total_price = %order.total_price,
        "Order before final task"
    );

    engine
        .orders
        .update_task(
            check.id,
            TaskUpdate {
                name: check.name.clone(),
                price: check.price,
                status: Some(TaskStatus::Done),
            },
        )
        .await?;

    let order = engine.orders.get_order(order_id).await?;
    tracing::info!(
        order_id = %order.id,
        status = %order.status,
        total_price = %order.total_price,
        ended_at = ?order.ended_at,
        vehicle = ?vehicles.availability(vehicle_id),
        "Order after final task"
    );

    let history = engine.orders.history(order_id).await?;
    for envelope in &history {
        tracing::debug!(
            sequence = envelope.sequence_number,
            event_type = %envelope.event_type,
            "Journal entry"
        );
    }

    println!("{}", engine.render_metrics()?);
    tracing::info!("✅ Demo finished");
    Ok(())
}
