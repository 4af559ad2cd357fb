// ============================================================================
// Inventory Domain - stock ledger for workshop parts
// ============================================================================
//
// - Value objects (InventoryPart, Reservation)
// - Errors (InventoryError)
// - Ledger (atomic reserve/release per part)
//
// ============================================================================

pub mod value_objects;
pub mod errors;
pub mod ledger;

pub use value_objects::*;
pub use errors::*;
pub use ledger::*;
