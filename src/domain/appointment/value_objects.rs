use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::errors::AppointmentError;

// ============================================================================
// Appointment Value Objects
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentStatus {
    Requested,
    Confirmed,
    Rejected,
    Completed,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Requested => "REQUESTED",
            AppointmentStatus::Confirmed => "CONFIRMED",
            AppointmentStatus::Rejected => "REJECTED",
            AppointmentStatus::Completed => "COMPLETED",
        }
    }

    /// Customer-facing label
    pub fn label(&self) -> &'static str {
        match self {
            AppointmentStatus::Requested => "⏳ Awaiting approval",
            AppointmentStatus::Confirmed => "✅ Confirmed",
            AppointmentStatus::Rejected => "❌ Rejected / Cancelled",
            AppointmentStatus::Completed => "🏁 Completed",
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppointmentStatus {
    type Err = AppointmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "REQUESTED" => Ok(AppointmentStatus::Requested),
            "CONFIRMED" => Ok(AppointmentStatus::Confirmed),
            "REJECTED" => Ok(AppointmentStatus::Rejected),
            "COMPLETED" => Ok(AppointmentStatus::Completed),
            _ => Err(AppointmentError::InvalidStatus(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub client_id: Uuid,
    pub vehicle_id: Option<Uuid>,
    pub requested_date: DateTime<Utc>,
    pub status: AppointmentStatus,
    pub description: String,
    /// Order created when the appointment was confirmed
    pub order_id: Option<Uuid>,
}

#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub client_id: Uuid,
    pub vehicle_id: Option<Uuid>,
    pub requested_date: DateTime<Utc>,
    pub description: String,
}
