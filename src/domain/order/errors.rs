use rust_decimal::Decimal;
use uuid::Uuid;

// ============================================================================
// Order Business Rule Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("Order not found: {0}")]
    OrderNotFound(Uuid),

    #[error("Task not found: {0}")]
    TaskNotFound(Uuid),

    #[error("Order part not found: {0}")]
    OrderPartNotFound(Uuid),

    #[error("Vehicle not found: {0}")]
    VehicleNotFound(Uuid),

    #[error("Invalid price: {0}")]
    InvalidPrice(Decimal),

    #[error("Invalid quantity: {0}")]
    InvalidQuantity(u32),

    #[error("Invalid status: {0}")]
    InvalidStatus(String),

    #[error("Task name cannot be empty")]
    EmptyTaskName,

    #[error("Aggregate not initialized")]
    NotInitialized,
}
