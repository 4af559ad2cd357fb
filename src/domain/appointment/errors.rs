use uuid::Uuid;

// ============================================================================
// Appointment Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AppointmentError {
    #[error("Appointment not found: {0}")]
    AppointmentNotFound(Uuid),

    #[error("Appointment {0} has no vehicle assigned")]
    MissingVehicle(Uuid),

    #[error("Invalid appointment status: {0}")]
    InvalidStatus(String),

    #[error("Appointment description cannot be empty")]
    EmptyDescription,
}
