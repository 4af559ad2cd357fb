use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::event_sourcing::Aggregate;
use super::commands::OrderCommand;
use super::errors::OrderError;
use super::events::*;
use super::status_engine::{self, TaskProgress};
use super::value_objects::{OrderPart, OrderStatus, OrderTask, TaskStatus};

// ============================================================================
// Order Aggregate - Domain Logic
// ============================================================================
//
// Invariants held after every applied event:
// - total_price == sum(task prices) + sum(part line costs), floored at zero
// - tasks_done == number of tasks whose status is Done
// - status == Completed implies ended_at is set
//
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderAggregate {
    // Identity
    pub id: Uuid,
    pub version: i64,

    pub vehicle_id: Uuid,
    pub mechanic_id: Option<Uuid>,
    pub status: OrderStatus,
    pub description: String,
    pub total_price: Decimal,

    pub tasks: Vec<OrderTask>,
    pub parts: Vec<OrderPart>,
    pub tasks_done: usize,

    // Audit Trail
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,

    pub deleted: bool,
}

impl OrderAggregate {
    /// Events that open a new order. There is no prior state to check.
    pub fn open(
        order_id: Uuid,
        vehicle_id: Uuid,
        mechanic_id: Option<Uuid>,
        description: String,
    ) -> OrderEvent {
        OrderEvent::Created(OrderCreated {
            order_id,
            vehicle_id,
            mechanic_id,
            description,
            created_at: Utc::now(),
        })
    }

    pub fn progress(&self) -> TaskProgress {
        TaskProgress {
            total: self.tasks.len(),
            done: self.tasks_done,
        }
    }

    /// Sum of every line, computed from scratch.
    pub fn recomputed_total(&self) -> Decimal {
        let tasks: Decimal = self.tasks.iter().map(|t| t.price).sum();
        let parts: Decimal = self.parts.iter().map(OrderPart::line_cost).sum();
        tasks + parts
    }

    pub fn task(&self, task_id: Uuid) -> Result<&OrderTask, OrderError> {
        self.tasks
            .iter()
            .find(|t| t.id == task_id)
            .ok_or(OrderError::TaskNotFound(task_id))
    }

    pub fn part(&self, order_part_id: Uuid) -> Result<&OrderPart, OrderError> {
        self.parts
            .iter()
            .find(|p| p.id == order_part_id)
            .ok_or(OrderError::OrderPartNotFound(order_part_id))
    }

    fn validate_task(name: &str, price: Decimal) -> Result<(), OrderError> {
        if name.trim().is_empty() {
            return Err(OrderError::EmptyTaskName);
        }
        if price.is_sign_negative() && !price.is_zero() {
            return Err(OrderError::InvalidPrice(price));
        }
        Ok(())
    }

    fn credit(&mut self, amount: Decimal) {
        self.total_price += amount;
    }

    fn debit(&mut self, amount: Decimal) {
        self.total_price = (self.total_price - amount).max(Decimal::ZERO);
    }

    /// Task events followed by the completion transition they cause, if any.
    fn with_completion_check(
        &self,
        mut events: Vec<OrderEvent>,
        progress: TaskProgress,
        now: DateTime<Utc>,
    ) -> Vec<OrderEvent> {
        events.extend(status_engine::evaluate_completion(self.status, progress, now));
        events
    }
}

// ============================================================================
// Aggregate Trait Implementation
// ============================================================================

impl Aggregate for OrderAggregate {
    type Event = OrderEvent;
    type Command = OrderCommand;
    type Error = OrderError;

    fn apply_first_event(event: &Self::Event) -> Result<Self, Self::Error> {
        match event {
            OrderEvent::Created(e) => Ok(Self {
                id: e.order_id,
                version: 0,
                vehicle_id: e.vehicle_id,
                mechanic_id: e.mechanic_id,
                status: OrderStatus::New,
                description: e.description.clone(),
                total_price: Decimal::ZERO,
                tasks: Vec::new(),
                parts: Vec::new(),
                tasks_done: 0,
                created_at: e.created_at,
                updated_at: e.created_at,
                ended_at: None,
                deleted: false,
            }),
            _ => Err(OrderError::NotInitialized),
        }
    }

    fn apply_event(&mut self, event: &Self::Event) -> Result<(), Self::Error> {
        match event {
            OrderEvent::Created(_) => {
                // First event already applied
            }
            OrderEvent::TaskAttached(e) => {
                if e.task.status.is_done() {
                    self.tasks_done += 1;
                }
                self.credit(e.task.price);
                self.tasks.push(e.task.clone());
            }
            OrderEvent::TaskUpdated(e) => {
                let task = self
                    .tasks
                    .iter_mut()
                    .find(|t| t.id == e.task_id)
                    .ok_or(OrderError::TaskNotFound(e.task_id))?;

                let was_done = task.status.is_done();
                let delta = e.price - task.price;
                task.name = e.name.clone();
                task.price = e.price;
                task.status = e.status;

                match (was_done, e.status.is_done()) {
                    (false, true) => self.tasks_done += 1,
                    (true, false) => self.tasks_done = self.tasks_done.saturating_sub(1),
                    _ => {}
                }
                self.total_price = (self.total_price + delta).max(Decimal::ZERO);
            }
            OrderEvent::TaskRemoved(e) => {
                let index = self
                    .tasks
                    .iter()
                    .position(|t| t.id == e.task_id)
                    .ok_or(OrderError::TaskNotFound(e.task_id))?;
                let task = self.tasks.remove(index);
                if task.status.is_done() {
                    self.tasks_done = self.tasks_done.saturating_sub(1);
                }
                self.debit(task.price);
            }
            OrderEvent::PartAttached(e) => {
                self.credit(e.part.line_cost());
                self.parts.push(e.part.clone());
            }
            OrderEvent::PartDetached(e) => {
                let index = self
                    .parts
                    .iter()
                    .position(|p| p.id == e.order_part_id)
                    .ok_or(OrderError::OrderPartNotFound(e.order_part_id))?;
                let part = self.parts.remove(index);
                self.debit(part.line_cost());
            }
            OrderEvent::Completed(e) => {
                self.status = OrderStatus::Completed;
                self.ended_at = Some(e.ended_at);
            }
            OrderEvent::Reopened(_) => {
                self.status = OrderStatus::InProgress;
                self.ended_at = None;
            }
            OrderEvent::StatusChanged(e) => {
                self.status = e.to;
                self.ended_at = match e.to {
                    OrderStatus::Completed => Some(e.changed_at),
                    _ => None,
                };
            }
            OrderEvent::MechanicAssigned(e) => {
                self.mechanic_id = Some(e.mechanic_id);
            }
            OrderEvent::Deleted(_) => {
                self.deleted = true;
                self.tasks.clear();
                self.parts.clear();
                self.tasks_done = 0;
                self.total_price = Decimal::ZERO;
            }
        }

        self.updated_at = Utc::now();
        Ok(())
    }

    fn handle_command(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        if self.deleted {
            return Err(OrderError::OrderNotFound(self.id));
        }

        let now = Utc::now();

        match command {
            OrderCommand::AttachTask { task_id, task } => {
                Self::validate_task(&task.name, task.price)?;
                let status = task.status.unwrap_or(TaskStatus::InProgress);

                let progress = TaskProgress {
                    total: self.tasks.len() + 1,
                    done: self.tasks_done + usize::from(status.is_done()),
                };
                let attached = OrderEvent::TaskAttached(TaskAttached {
                    task: OrderTask {
                        id: *task_id,
                        order_id: self.id,
                        name: task.name.trim().to_string(),
                        price: task.price,
                        status,
                    },
                });

                Ok(self.with_completion_check(vec![attached], progress, now))
            }

            OrderCommand::UpdateTask { task_id, update } => {
                let current = self.task(*task_id)?;
                Self::validate_task(&update.name, update.price)?;
                let status = update.status.unwrap_or(current.status);

                let done = self.tasks_done - usize::from(current.status.is_done())
                    + usize::from(status.is_done());
                let progress = TaskProgress { total: self.tasks.len(), done };
                let updated = OrderEvent::TaskUpdated(TaskUpdated {
                    task_id: *task_id,
                    name: update.name.trim().to_string(),
                    price: update.price,
                    status,
                });

                Ok(self.with_completion_check(vec![updated], progress, now))
            }

            OrderCommand::RemoveTask { task_id } => {
                let current = self.task(*task_id)?;

                let progress = TaskProgress {
                    total: self.tasks.len() - 1,
                    done: self.tasks_done - usize::from(current.status.is_done()),
                };
                let removed = OrderEvent::TaskRemoved(TaskRemoved { task_id: *task_id });

                Ok(self.with_completion_check(vec![removed], progress, now))
            }

            OrderCommand::AttachPart { order_part_id, reservation } => {
                if reservation.quantity == 0 {
                    return Err(OrderError::InvalidQuantity(0));
                }
                if reservation.unit_price.is_sign_negative() && !reservation.unit_price.is_zero() {
                    return Err(OrderError::InvalidPrice(reservation.unit_price));
                }

                Ok(vec![OrderEvent::PartAttached(PartAttached {
                    part: OrderPart {
                        id: *order_part_id,
                        order_id: self.id,
                        part_id: reservation.part_id,
                        reservation_id: reservation.id,
                        quantity: reservation.quantity,
                        unit_price: reservation.unit_price,
                    },
                })])
            }

            OrderCommand::DetachPart { order_part_id } => {
                self.part(*order_part_id)?;
                Ok(vec![OrderEvent::PartDetached(PartDetached {
                    order_part_id: *order_part_id,
                })])
            }

            OrderCommand::SetStatus { status } => {
                if *status == self.status {
                    return Ok(vec![]);
                }
                Ok(vec![OrderEvent::StatusChanged(OrderStatusChanged {
                    from: self.status,
                    to: *status,
                    changed_at: now,
                })])
            }

            OrderCommand::AssignMechanic { mechanic_id } => {
                Ok(vec![OrderEvent::MechanicAssigned(MechanicAssigned {
                    mechanic_id: *mechanic_id,
                })])
            }

            OrderCommand::DeleteOrder => Ok(vec![OrderEvent::Deleted(OrderDeleted {
                released_parts: self.parts.iter().map(|p| p.id).collect(),
                deleted_at: now,
            })]),
        }
    }

    fn aggregate_id(&self) -> Uuid {
        self.id
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn set_version(&mut self, version: i64) {
        self.version = version;
    }
}
