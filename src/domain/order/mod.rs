// ============================================================================
// Order Domain - Service orders, their tasks and part lines
// ============================================================================
//
// - Value objects (OrderStatus, OrderTask, OrderPart)
// - Events and commands
// - Aggregate (OrderAggregate: totals, completion counters)
// - Status engine (completion rule, side effects of a transition)
// - Command handler (locking, stock reservation, journal, dispatch)
//
// ============================================================================

pub mod value_objects;
pub mod events;
pub mod commands;
pub mod errors;
pub mod aggregate;
pub mod status_engine;
pub mod command_handler;

pub use value_objects::*;
pub use events::*;
pub use commands::*;
pub use errors::*;
pub use aggregate::*;
pub use status_engine::{SideEffect, TaskProgress};
pub use command_handler::*;
