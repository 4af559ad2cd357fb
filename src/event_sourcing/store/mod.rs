// ============================================================================
// Event Journal - Generic Persistence Layer
// ============================================================================

pub mod event_store;

pub use event_store::EventStore;
