use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::domain::inventory::Reservation;
use super::errors::OrderError;

// ============================================================================
// Order Value Objects
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    New,
    InProgress,
    WaitingParts,
    Completed,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::New => "NEW",
            OrderStatus::InProgress => "IN_PROGRESS",
            OrderStatus::WaitingParts => "WAITING_PARTS",
            OrderStatus::Completed => "COMPLETED",
        }
    }

    /// Customer-facing label
    pub fn label(&self) -> &'static str {
        match self {
            OrderStatus::New => "🆕 New",
            OrderStatus::InProgress => "⚙️ In progress",
            OrderStatus::WaitingParts => "📦 Waiting for parts",
            OrderStatus::Completed => "✅ Completed",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NEW" => Ok(OrderStatus::New),
            "IN_PROGRESS" => Ok(OrderStatus::InProgress),
            "WAITING_PARTS" => Ok(OrderStatus::WaitingParts),
            "COMPLETED" => Ok(OrderStatus::Completed),
            _ => Err(OrderError::InvalidStatus(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Done,
}

impl TaskStatus {
    pub fn is_done(&self) -> bool {
        matches!(self, TaskStatus::Done)
    }
}

impl FromStr for TaskStatus {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "TODO" => Ok(TaskStatus::Todo),
            "IN_PROGRESS" => Ok(TaskStatus::InProgress),
            "DONE" => Ok(TaskStatus::Done),
            _ => Err(OrderError::InvalidStatus(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderTask {
    pub id: Uuid,
    pub order_id: Uuid,
    pub name: String,
    pub price: Decimal,
    pub status: TaskStatus,
}

/// A part line on an order, backed by a live stock reservation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderPart {
    pub id: Uuid,
    pub order_id: Uuid,
    pub part_id: Uuid,
    pub reservation_id: Uuid,
    pub quantity: u32,
    pub unit_price: Decimal,
}

impl OrderPart {
    pub fn line_cost(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }

    pub fn reservation(&self) -> Reservation {
        Reservation {
            id: self.reservation_id,
            part_id: self.part_id,
            quantity: self.quantity,
            unit_price: self.unit_price,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewTask {
    pub name: String,
    pub price: Decimal,
    /// Defaults to InProgress
    pub status: Option<TaskStatus>,
}

impl NewTask {
    pub fn new(name: impl Into<String>, price: Decimal) -> Self {
        Self { name: name.into(), price, status: None }
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }
}

/// Replacement values for a task. A missing status keeps the current one.
#[derive(Debug, Clone)]
pub struct TaskUpdate {
    pub name: String,
    pub price: Decimal,
    pub status: Option<TaskStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_parsing() {
        assert_eq!("in_progress".parse::<OrderStatus>().unwrap(), OrderStatus::InProgress);
        assert_eq!("WAITING_PARTS".parse::<OrderStatus>().unwrap(), OrderStatus::WaitingParts);
        assert!(matches!(
            "SHIPPED".parse::<OrderStatus>(),
            Err(OrderError::InvalidStatus(_))
        ));
    }

    #[test]
    fn test_order_status_serializes_as_wire_name() {
        let json = serde_json::to_string(&OrderStatus::WaitingParts).unwrap();
        assert_eq!(json, "\"WAITING_PARTS\"");
        assert_eq!(OrderStatus::WaitingParts.to_string(), "WAITING_PARTS");
    }

    #[test]
    fn test_task_status_parsing() {
        assert_eq!("done".parse::<TaskStatus>().unwrap(), TaskStatus::Done);
        assert!("FINISHED".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn test_order_part_line_cost_and_reservation() {
        let line = OrderPart {
            id: Uuid::new_v4(),
            order_id: Uuid::new_v4(),
            part_id: Uuid::new_v4(),
            reservation_id: Uuid::new_v4(),
            quantity: 2,
            unit_price: Decimal::new(4500, 2),
        };
        assert_eq!(line.line_cost(), Decimal::new(9000, 2));
        assert_eq!(line.reservation().line_cost(), line.line_cost());
    }
}
