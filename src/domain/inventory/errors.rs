use rust_decimal::Decimal;
use uuid::Uuid;

// ============================================================================
// Inventory Business Rule Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum InventoryError {
    #[error("Part not found: {0}")]
    PartNotFound(Uuid),

    #[error("Insufficient stock for part {part_id}: requested {requested}, available {available}")]
    InsufficientStock {
        part_id: Uuid,
        requested: u32,
        available: u32,
    },

    #[error("Invalid quantity: {0}")]
    InvalidQuantity(i64),

    #[error("Invalid unit price: {0}")]
    InvalidPrice(Decimal),

    #[error("Part {part_id} still has {reserved} units reserved by orders")]
    PartInUse { part_id: Uuid, reserved: u32 },

    #[error("Part name cannot be empty")]
    EmptyName,
}
