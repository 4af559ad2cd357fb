use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::event_sourcing::DomainEvent;
use super::value_objects::{OrderPart, OrderStatus, OrderTask, TaskStatus};

// ============================================================================
// Order Events - Domain Events for Order Aggregate
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum OrderEvent {
    Created(OrderCreated),
    TaskAttached(TaskAttached),
    TaskUpdated(TaskUpdated),
    TaskRemoved(TaskRemoved),
    PartAttached(PartAttached),
    PartDetached(PartDetached),
    Completed(OrderCompleted),
    Reopened(OrderReopened),
    StatusChanged(OrderStatusChanged),
    MechanicAssigned(MechanicAssigned),
    Deleted(OrderDeleted),
}

impl DomainEvent for OrderEvent {
    fn event_type(&self) -> &'static str {
        match self {
            OrderEvent::Created(_) => "OrderCreated",
            OrderEvent::TaskAttached(_) => "TaskAttached",
            OrderEvent::TaskUpdated(_) => "TaskUpdated",
            OrderEvent::TaskRemoved(_) => "TaskRemoved",
            OrderEvent::PartAttached(_) => "PartAttached",
            OrderEvent::PartDetached(_) => "PartDetached",
            OrderEvent::Completed(_) => "OrderCompleted",
            OrderEvent::Reopened(_) => "OrderReopened",
            OrderEvent::StatusChanged(_) => "OrderStatusChanged",
            OrderEvent::MechanicAssigned(_) => "MechanicAssigned",
            OrderEvent::Deleted(_) => "OrderDeleted",
        }
    }
}

// ============================================================================
// Individual Event Types
// ============================================================================

/// Order Created - Initial event in order lifecycle
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct OrderCreated {
    pub order_id: Uuid,
    pub vehicle_id: Uuid,
    pub mechanic_id: Option<Uuid>,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TaskAttached {
    pub task: OrderTask,
}

/// Task fields replaced; the previous values are read from state when applied
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TaskUpdated {
    pub task_id: Uuid,
    pub name: String,
    pub price: Decimal,
    pub status: TaskStatus,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TaskRemoved {
    pub task_id: Uuid,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PartAttached {
    pub part: OrderPart,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PartDetached {
    pub order_part_id: Uuid,
}

/// Every task is done
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct OrderCompleted {
    pub ended_at: DateTime<Utc>,
}

/// A completed order has an unfinished task again
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct OrderReopened {
    pub reopened_at: DateTime<Utc>,
}

/// Manual override by staff
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct OrderStatusChanged {
    pub from: OrderStatus,
    pub to: OrderStatus,
    pub changed_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct MechanicAssigned {
    pub mechanic_id: Uuid,
}

/// Order removed; lists the part lines whose stock went back to inventory
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct OrderDeleted {
    pub released_parts: Vec<Uuid>,
    pub deleted_at: DateTime<Utc>,
}
