//! Order and inventory consistency engine for an automotive workshop.
//!
//! Keeps service-order totals in step with their tasks and part lines,
//! reserves stock atomically, derives order status from task completion and
//! turns confirmed appointments into orders.

pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod event_sourcing;
pub mod messaging;
pub mod metrics;
pub mod registry;
pub mod utils;

pub use config::EngineConfig;
pub use engine::Engine;
pub use error::{EngineError, ErrorKind};
