use uuid::Uuid;

use crate::domain::appointment::AppointmentError;
use crate::domain::inventory::InventoryError;
use crate::domain::order::OrderError;
use crate::registry::RegistryError;

// ============================================================================
// Engine Errors
// ============================================================================
//
// Aggregate-level errors are wrapped here together with the failures that only
// exist at the orchestration layer (lock waits, journal conflicts, registry
// lookups made before a write). Notifier
// failures never appear: they are swallowed by the dispatcher.
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Order(#[from] OrderError),

    #[error(transparent)]
    Inventory(#[from] InventoryError),

    #[error(transparent)]
    Appointment(#[from] AppointmentError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("Timed out waiting for {resource} lock: {id}")]
    LockTimeout { resource: &'static str, id: Uuid },

    #[error("Journal write failed: {0}")]
    Journal(String),
}

/// Coarse classification callers use to pick a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InsufficientStock,
    InvalidInput,
    Conflict,
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::Order(e) => match e {
                OrderError::OrderNotFound(_)
                | OrderError::TaskNotFound(_)
                | OrderError::OrderPartNotFound(_)
                | OrderError::VehicleNotFound(_) => ErrorKind::NotFound,
                OrderError::InvalidPrice(_)
                | OrderError::InvalidQuantity(_)
                | OrderError::InvalidStatus(_)
                | OrderError::EmptyTaskName => ErrorKind::InvalidInput,
                OrderError::NotInitialized => ErrorKind::Conflict,
            },
            EngineError::Inventory(e) => match e {
                InventoryError::PartNotFound(_) => ErrorKind::NotFound,
                InventoryError::InsufficientStock { .. } => ErrorKind::InsufficientStock,
                InventoryError::InvalidQuantity(_)
                | InventoryError::InvalidPrice(_)
                | InventoryError::EmptyName => ErrorKind::InvalidInput,
                InventoryError::PartInUse { .. } => ErrorKind::Conflict,
            },
            EngineError::Appointment(e) => match e {
                AppointmentError::AppointmentNotFound(_) | AppointmentError::MissingVehicle(_) => {
                    ErrorKind::NotFound
                }
                AppointmentError::InvalidStatus(_) | AppointmentError::EmptyDescription => {
                    ErrorKind::InvalidInput
                }
            },
            EngineError::Registry(RegistryError::VehicleNotFound(_)) => ErrorKind::NotFound,
            EngineError::Registry(RegistryError::Unavailable(_))
            | EngineError::LockTimeout { .. }
            | EngineError::Journal(_) => ErrorKind::Conflict,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}
