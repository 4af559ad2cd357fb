use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::domain::inventory::{InventoryLedger, Reservation};
use crate::error::EngineError;
use crate::event_sourcing::{Aggregate, EventEnvelope, EventStore};
use crate::messaging::EffectDispatcher;
use crate::metrics::Metrics;
use crate::registry::VehicleRegistry;
use crate::utils::lock_entity;

use super::aggregate::OrderAggregate;
use super::commands::OrderCommand;
use super::errors::OrderError;
use super::events::OrderEvent;
use super::status_engine::{self, SideEffect};
use super::value_objects::{NewTask, OrderPart, OrderStatus, OrderTask, TaskUpdate};

// ============================================================================
// Order Command Handler
// ============================================================================
//
// Orchestrates: Command → Aggregate → Events → Journal → Side effects
//
// Every mutation holds the order's lock from validation to commit. Stock is
// reserved or released while that lock is held, so the lock order is always
// order then part. Vehicle availability follows the commit under the same
// lock; notifications go out after it is dropped. Neither can undo a
// committed change.
//
// ============================================================================

/// Criteria for `list_orders`. Unset fields match everything.
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub vehicle_id: Option<Uuid>,
    pub mechanic_id: Option<Uuid>,
    /// Case-insensitive match on the description
    pub search: Option<String>,
}

impl OrderFilter {
    pub fn matches(&self, order: &OrderAggregate) -> bool {
        if self.status.is_some_and(|status| status != order.status) {
            return false;
        }
        if self.vehicle_id.is_some_and(|id| id != order.vehicle_id) {
            return false;
        }
        if self.mechanic_id.is_some() && self.mechanic_id != order.mechanic_id {
            return false;
        }
        match &self.search {
            Some(query) => order
                .description
                .to_lowercase()
                .contains(&query.trim().to_lowercase()),
            None => true,
        }
    }
}

pub struct OrderCommandHandler {
    orders: DashMap<Uuid, Arc<Mutex<OrderAggregate>>>,
    /// task id → order id
    task_index: DashMap<Uuid, Uuid>,
    /// order part id → order id
    part_index: DashMap<Uuid, Uuid>,
    journal: EventStore<OrderEvent>,
    inventory: Arc<InventoryLedger>,
    vehicles: Arc<dyn VehicleRegistry>,
    effects: Arc<EffectDispatcher>,
    metrics: Arc<Metrics>,
    lock_timeout: Duration,
}

impl OrderCommandHandler {
    pub fn new(
        inventory: Arc<InventoryLedger>,
        vehicles: Arc<dyn VehicleRegistry>,
        effects: Arc<EffectDispatcher>,
        metrics: Arc<Metrics>,
        lock_timeout: Duration,
    ) -> Self {
        Self {
            orders: DashMap::new(),
            task_index: DashMap::new(),
            part_index: DashMap::new(),
            journal: EventStore::new("Order"),
            inventory,
            vehicles,
            effects,
            metrics,
            lock_timeout,
        }
    }

    // ------------------------------------------------------------------------
    // Lookup and locking
    // ------------------------------------------------------------------------

    fn handle_of(&self, order_id: Uuid) -> Result<Arc<Mutex<OrderAggregate>>, OrderError> {
        self.orders
            .get(&order_id)
            .map(|entry| entry.value().clone())
            .ok_or(OrderError::OrderNotFound(order_id))
    }

    fn order_of_task(&self, task_id: Uuid) -> Result<Uuid, OrderError> {
        self.task_index
            .get(&task_id)
            .map(|entry| *entry.value())
            .ok_or(OrderError::TaskNotFound(task_id))
    }

    fn order_of_part(&self, order_part_id: Uuid) -> Result<Uuid, OrderError> {
        self.part_index
            .get(&order_part_id)
            .map(|entry| *entry.value())
            .ok_or(OrderError::OrderPartNotFound(order_part_id))
    }

    async fn lock<'a>(
        &self,
        handle: &'a Mutex<OrderAggregate>,
        order_id: Uuid,
    ) -> Result<MutexGuard<'a, OrderAggregate>, EngineError> {
        let order = lock_entity(handle, "order", order_id, self.lock_timeout, &self.metrics).await?;
        if order.deleted {
            return Err(OrderError::OrderNotFound(order_id).into());
        }
        Ok(order)
    }

    // ------------------------------------------------------------------------
    // Commit pipeline
    // ------------------------------------------------------------------------

    /// Apply `events` to a copy of the order, journal them, then swap the copy
    /// in. On any failure the live order is left untouched.
    async fn persist(
        &self,
        order: &mut OrderAggregate,
        events: &[OrderEvent],
        correlation_id: Uuid,
    ) -> Result<(), EngineError> {
        if events.is_empty() {
            return Ok(());
        }

        let mut next = order.clone();
        for event in events {
            next.apply_event(event)?;
        }

        let version = self
            .journal
            .append_events(order.id, order.version, events.to_vec(), correlation_id)
            .await
            .map_err(|e| EngineError::Journal(e.to_string()))?;
        next.set_version(version);
        *order = next;

        for event in events {
            match event {
                OrderEvent::Completed(_) => {
                    self.metrics.orders_completed.inc();
                    tracing::info!(order_id = %order.id, "Order completed: all tasks done");
                }
                OrderEvent::Reopened(_) => {
                    self.metrics.orders_reopened.inc();
                    tracing::info!(order_id = %order.id, "Order reopened");
                }
                _ => {}
            }
        }

        Ok(())
    }

    async fn commit(
        &self,
        order: &mut OrderAggregate,
        command: &OrderCommand,
        correlation_id: Uuid,
    ) -> Result<Vec<OrderEvent>, EngineError> {
        let events = order.handle_command(command)?;
        self.persist(order, &events, correlation_id).await?;
        Ok(events)
    }

    /// Write the vehicle availability a committed batch calls for and hand
    /// back the notifications. Must be called with the order lock held, so
    /// availability writes for one order land in commit order.
    async fn apply_vehicle_state(
        &self,
        order: &OrderAggregate,
        events: &[OrderEvent],
    ) -> Vec<SideEffect> {
        let (state, notices): (Vec<_>, Vec<_>) =
            status_engine::effects_for(order.id, order.vehicle_id, events)
                .into_iter()
                .partition(SideEffect::is_vehicle_state);
        if !state.is_empty() {
            self.effects.apply(state).await;
        }
        notices
    }

    async fn notify(&self, notices: Vec<SideEffect>) {
        if !notices.is_empty() {
            self.effects.apply(notices).await;
        }
    }

    /// Run one command against one order. Notifications go out after the lock
    /// is released.
    async fn execute(
        &self,
        order_id: Uuid,
        command: OrderCommand,
    ) -> Result<OrderAggregate, EngineError> {
        let correlation_id = Uuid::new_v4();
        let handle = self.handle_of(order_id)?;

        let (snapshot, event_count, notices) = {
            let mut order = self.lock(&handle, order_id).await?;
            let events = self.commit(&mut order, &command, correlation_id).await?;
            let notices = self.apply_vehicle_state(&order, &events).await;
            (order.clone(), events.len(), notices)
        };

        tracing::debug!(
            order_id = %order_id,
            correlation_id = %correlation_id,
            event_count = event_count,
            version = snapshot.version,
            "Order command committed"
        );

        self.notify(notices).await;
        Ok(snapshot)
    }

    /// Return a reservation's units to the shelf. The order side has already
    /// let go of them, so a failure is logged rather than returned.
    async fn give_back(&self, order_id: Uuid, reservation: &Reservation) {
        if let Err(e) = self.inventory.release(reservation).await {
            tracing::error!(
                order_id = %order_id,
                part_id = %reservation.part_id,
                reservation_id = %reservation.id,
                quantity = reservation.quantity,
                error = %e,
                "Failed to return reserved stock"
            );
        }
    }

    // ------------------------------------------------------------------------
    // Orders
    // ------------------------------------------------------------------------

    pub async fn create_order(
        &self,
        vehicle_id: Uuid,
        mechanic_id: Option<Uuid>,
        description: impl Into<String>,
    ) -> Result<OrderAggregate, EngineError> {
        if self.vehicles.vehicle(vehicle_id).await?.is_none() {
            return Err(OrderError::VehicleNotFound(vehicle_id).into());
        }

        let order_id = Uuid::new_v4();
        let created = OrderAggregate::open(order_id, vehicle_id, mechanic_id, description.into());
        let mut order = OrderAggregate::apply_first_event(&created)?;

        let version = self
            .journal
            .append_events(order_id, 0, vec![created], Uuid::new_v4())
            .await
            .map_err(|e| EngineError::Journal(e.to_string()))?;
        order.set_version(version);

        self.orders.insert(order_id, Arc::new(Mutex::new(order.clone())));
        self.metrics.orders_created.inc();

        tracing::info!(
            order_id = %order_id,
            vehicle_id = %vehicle_id,
            mechanic_id = ?mechanic_id,
            "Order created"
        );

        Ok(order)
    }

    pub async fn get_order(&self, order_id: Uuid) -> Result<OrderAggregate, EngineError> {
        let handle = self.handle_of(order_id)?;
        let order = self.lock(&handle, order_id).await?;
        Ok(order.clone())
    }

    /// Orders matching `filter`, newest first.
    pub async fn list_orders(
        &self,
        filter: &OrderFilter,
    ) -> Result<Vec<OrderAggregate>, EngineError> {
        let handles: Vec<(Uuid, Arc<Mutex<OrderAggregate>>)> = self
            .orders
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();

        let mut orders = Vec::new();
        for (order_id, handle) in handles {
            let order =
                lock_entity(&handle, "order", order_id, self.lock_timeout, &self.metrics).await?;
            if !order.deleted && filter.matches(&order) {
                orders.push(order.clone());
            }
        }

        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    /// Manual override. Always allowed; the vehicle owner is told about it.
    pub async fn set_status(
        &self,
        order_id: Uuid,
        status: OrderStatus,
    ) -> Result<OrderAggregate, EngineError> {
        let order = self.execute(order_id, OrderCommand::SetStatus { status }).await?;
        tracing::info!(order_id = %order_id, status = %status, "Order status set");
        Ok(order)
    }

    pub async fn assign_mechanic(
        &self,
        order_id: Uuid,
        mechanic_id: Uuid,
    ) -> Result<OrderAggregate, EngineError> {
        self.execute(order_id, OrderCommand::AssignMechanic { mechanic_id }).await
    }

    /// Remove an order and return every reserved part to stock.
    pub async fn delete_order(&self, order_id: Uuid) -> Result<(), EngineError> {
        let correlation_id = Uuid::new_v4();
        let handle = self.handle_of(order_id)?;
        let mut order = self.lock(&handle, order_id).await?;

        let task_ids: Vec<Uuid> = order.tasks.iter().map(|t| t.id).collect();
        let reservations: Vec<Reservation> =
            order.parts.iter().map(OrderPart::reservation).collect();
        self.commit(&mut order, &OrderCommand::DeleteOrder, correlation_id).await?;

        for task_id in &task_ids {
            self.task_index.remove(task_id);
        }
        self.part_index.retain(|_, owner| *owner != order_id);
        for reservation in &reservations {
            self.give_back(order_id, reservation).await;
        }
        drop(order);
        self.orders.remove(&order_id);

        tracing::info!(
            order_id = %order_id,
            released_parts = reservations.len(),
            "Order deleted"
        );
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Tasks
    // ------------------------------------------------------------------------

    /// The task becomes reachable by id in the same locked section that
    /// commits it, so a concurrent delete always sees it.
    pub async fn attach_task(
        &self,
        order_id: Uuid,
        task: NewTask,
    ) -> Result<OrderTask, EngineError> {
        let correlation_id = Uuid::new_v4();
        let task_id = Uuid::new_v4();
        let handle = self.handle_of(order_id)?;

        let (snapshot, notices) = {
            let mut order = self.lock(&handle, order_id).await?;
            let command = OrderCommand::AttachTask { task_id, task };
            let events = self.commit(&mut order, &command, correlation_id).await?;
            self.task_index.insert(task_id, order_id);
            let notices = self.apply_vehicle_state(&order, &events).await;
            (order.clone(), notices)
        };

        let task = snapshot.task(task_id)?.clone();
        tracing::info!(
            order_id = %order_id,
            task_id = %task_id,
            price = %task.price,
            total_price = %snapshot.total_price,
            "Task attached"
        );

        self.notify(notices).await;
        Ok(task)
    }

    /// Replace a task's fields; the order total moves by the price delta.
    pub async fn update_task(
        &self,
        task_id: Uuid,
        update: TaskUpdate,
    ) -> Result<OrderTask, EngineError> {
        let order_id = self.order_of_task(task_id)?;
        let order = self.execute(order_id, OrderCommand::UpdateTask { task_id, update }).await?;

        let task = order.task(task_id)?.clone();
        tracing::info!(
            order_id = %order_id,
            task_id = %task_id,
            status = ?task.status,
            total_price = %order.total_price,
            "Task updated"
        );
        Ok(task)
    }

    pub async fn remove_task(&self, task_id: Uuid) -> Result<OrderAggregate, EngineError> {
        let order_id = self.order_of_task(task_id)?;
        let order = self.execute(order_id, OrderCommand::RemoveTask { task_id }).await?;
        self.task_index.remove(&task_id);

        tracing::info!(order_id = %order_id, task_id = %task_id, "Task removed");
        Ok(order)
    }

    // ------------------------------------------------------------------------
    // Parts
    // ------------------------------------------------------------------------

    /// Reserve stock and add the part line as one unit: if the order side
    /// fails, the reservation is released again.
    pub async fn attach_part(
        &self,
        order_id: Uuid,
        part_id: Uuid,
        quantity: u32,
    ) -> Result<OrderPart, EngineError> {
        let correlation_id = Uuid::new_v4();
        let order_part_id = Uuid::new_v4();
        let handle = self.handle_of(order_id)?;

        let (snapshot, notices) = {
            let mut order = self.lock(&handle, order_id).await?;
            let reservation = self.inventory.reserve(part_id, quantity).await?;
            let command = OrderCommand::AttachPart {
                order_part_id,
                reservation: reservation.clone(),
            };

            let events = match self.commit(&mut order, &command, correlation_id).await {
                Ok(events) => events,
                Err(e) => {
                    self.give_back(order_id, &reservation).await;
                    return Err(e);
                }
            };
            self.part_index.insert(order_part_id, order_id);
            let notices = self.apply_vehicle_state(&order, &events).await;
            (order.clone(), notices)
        };

        let part = snapshot.part(order_part_id)?.clone();
        tracing::info!(
            order_id = %order_id,
            part_id = %part_id,
            quantity = quantity,
            line_cost = %part.line_cost(),
            total_price = %snapshot.total_price,
            "Part attached"
        );

        self.notify(notices).await;
        Ok(part)
    }

    /// Return a part line's stock and drop it from the order. The total never
    /// goes below zero.
    pub async fn detach_part(&self, order_part_id: Uuid) -> Result<OrderAggregate, EngineError> {
        let correlation_id = Uuid::new_v4();
        let order_id = self.order_of_part(order_part_id)?;
        let handle = self.handle_of(order_id)?;

        let snapshot = {
            let mut order = self.lock(&handle, order_id).await?;
            let reservation = order.part(order_part_id)?.reservation();
            self.commit(&mut order, &OrderCommand::DetachPart { order_part_id }, correlation_id)
                .await?;

            self.part_index.remove(&order_part_id);
            self.give_back(order_id, &reservation).await;
            order.clone()
        };

        tracing::info!(
            order_id = %order_id,
            order_part_id = %order_part_id,
            total_price = %snapshot.total_price,
            "Part detached"
        );
        Ok(snapshot)
    }

    // ------------------------------------------------------------------------
    // Journal
    // ------------------------------------------------------------------------

    /// Every event ever recorded for the order, oldest first. Still available
    /// after the order is deleted.
    pub async fn history(
        &self,
        order_id: Uuid,
    ) -> Result<Vec<EventEnvelope<OrderEvent>>, EngineError> {
        let events = self
            .journal
            .load_events(order_id)
            .await
            .map_err(|e| EngineError::Journal(e.to_string()))?;
        if events.is_empty() {
            return Err(OrderError::OrderNotFound(order_id).into());
        }
        Ok(events)
    }

    /// Rebuild the order from its journal alone.
    pub async fn replay(&self, order_id: Uuid) -> Result<OrderAggregate, EngineError> {
        if !self.journal.aggregate_exists(order_id).await {
            return Err(OrderError::OrderNotFound(order_id).into());
        }
        self.journal
            .load_aggregate::<OrderAggregate>(order_id)
            .await
            .map_err(|e| EngineError::Journal(e.to_string()))
    }
}
