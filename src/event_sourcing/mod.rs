// ============================================================================
// Event Sourcing Infrastructure
// ============================================================================
//
// Generic aggregate/event plumbing. Domain-specific code is in src/domain/
//
// ============================================================================

mod core;
mod store;

pub use self::core::*;
pub use self::store::*;
