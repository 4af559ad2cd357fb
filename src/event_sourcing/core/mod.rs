// ============================================================================
// Event Sourcing Core - Generic Abstractions
// ============================================================================
//
// No domain-specific code (no Order, InventoryPart, Appointment) lives here.
//
// ============================================================================

pub mod aggregate;
pub mod event;

pub use aggregate::Aggregate;
pub use event::{DomainEvent, EventEnvelope};
