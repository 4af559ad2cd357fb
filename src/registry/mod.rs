// ============================================================================
// External Registries
// ============================================================================
//
// Read/write access to entities other services own: vehicles and the
// notification addresses of their owners.
//
// ============================================================================

mod clients;
mod vehicles;

pub use clients::*;
pub use vehicles::*;
