use uuid::Uuid;

use crate::domain::inventory::Reservation;
use super::value_objects::{NewTask, OrderStatus, TaskUpdate};

// ============================================================================
// Order Commands - Represent user intent
//
// Creation is not a command: a new order has no state to validate against,
// see `OrderAggregate::open`.
//
// ============================================================================

#[derive(Debug, Clone)]
pub enum OrderCommand {
    AttachTask {
        task_id: Uuid,
        task: NewTask,
    },
    UpdateTask {
        task_id: Uuid,
        update: TaskUpdate,
    },
    RemoveTask {
        task_id: Uuid,
    },
    /// The reservation has already been taken from the ledger
    AttachPart {
        order_part_id: Uuid,
        reservation: Reservation,
    },
    DetachPart {
        order_part_id: Uuid,
    },
    SetStatus {
        status: OrderStatus,
    },
    AssignMechanic {
        mechanic_id: Uuid,
    },
    DeleteOrder,
}
