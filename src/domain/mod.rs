// ============================================================================
// Domain Layer - Business Logic
// ============================================================================
//
// One subdirectory per aggregate:
// - inventory: parts catalog and stock reservations
// - order: service orders, totals and status derivation
// - appointment: visit requests and their conversion into orders
//
// Generic event plumbing lives in src/event_sourcing/.
//
// ============================================================================

pub mod inventory;
pub mod order;
pub mod appointment;
