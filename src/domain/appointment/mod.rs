// ============================================================================
// Appointment Domain - Customer visit requests
// ============================================================================
//
// Appointments are plain records behind a per-appointment lock. Their one
// piece of behaviour is conversion: a confirmed appointment becomes an order.
//
// ============================================================================

pub mod value_objects;
pub mod errors;
pub mod converter;
pub mod command_handler;

pub use value_objects::*;
pub use errors::*;
pub use converter::*;
pub use command_handler::*;
