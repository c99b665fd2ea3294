use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use doctor_cell::models::DoctorError;
use shared_models::error::AppError;
use shared_utils::time_mapping;

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

/// Stored appointment. `appointment_start_time` is the canonical 24-hour form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: String,
    pub user_id: String,
    pub doctor_id: String,
    #[serde(default)]
    pub hospital_id: String,
    #[serde(default)]
    pub department_id: String,
    pub date: NaiveDate,
    pub appointment_start_time: String,
    #[serde(default)]
    pub reason_for_visit: String,
    #[serde(default)]
    pub appointment_notes: String,
}

impl Appointment {
    /// Wall-clock start. An unparseable start time counts as the start of the day.
    pub fn starts_at(&self) -> NaiveDateTime {
        let time = NaiveTime::parse_from_str(&self.appointment_start_time, "%H:%M")
            .unwrap_or_default();
        self.date.and_time(time)
    }

    pub fn phase(&self, cutoff: NaiveDateTime) -> AppointmentPhase {
        if self.starts_at() >= cutoff {
            AppointmentPhase::Upcoming
        } else {
            AppointmentPhase::Past
        }
    }

    /// Display form of the start time, or the stored value when it is off the grid.
    pub fn display_time(&self) -> String {
        time_mapping::to_12_hour(&self.appointment_start_time)
            .map(str::to_string)
            .unwrap_or_else(|| self.appointment_start_time.clone())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentPhase {
    Upcoming,
    Past,
}

/// `now + buffer`, or `now` itself when the sum leaves chrono's range.
pub fn upcoming_cutoff(now: NaiveDateTime, buffer: Duration) -> NaiveDateTime {
    now.checked_add_signed(buffer).unwrap_or(now)
}

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

/// New booking. `appointment_time` is the display form picked from the available slots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    pub user_id: String,
    pub hospital_id: String,
    pub doctor_id: String,
    pub date: NaiveDate,
    pub appointment_time: String,
    #[serde(default)]
    pub reason_for_visit: String,
    #[serde(default)]
    pub appointment_notes: String,
}

/// Whole-record edit of an upcoming appointment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateAppointmentRequest {
    pub user_id: String,
    pub hospital_id: String,
    pub doctor_id: String,
    pub date: NaiveDate,
    pub appointment_time: String,
    #[serde(default)]
    pub reason_for_visit: String,
    #[serde(default)]
    pub appointment_notes: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateNotesRequest {
    pub appointment_notes: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AvailabilityQuery {
    pub doctor_id: String,
    pub date: NaiveDate,
    pub editing_appointment_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PastAppointmentFilters {
    pub doctor_id: Option<String>,
    pub user_id: Option<String>,
    pub hospital_id: Option<String>,
    pub date: Option<NaiveDate>,
}

// ==============================================================================
// LISTING MODELS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientSummary {
    pub id: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
}

/// Appointment joined with its doctor and patient for the console tables.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppointmentListing {
    #[serde(flatten)]
    pub appointment: Appointment,
    pub display_time: String,
    pub doctor_name: String,
    pub patient: PatientSummary,
    pub phase: AppointmentPhase,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Debug, Error)]
pub enum AppointmentError {
    #[error("Appointment not found")]
    NotFound,

    #[error("Doctor not found")]
    DoctorNotFound,

    #[error("Appointment slot not available")]
    SlotNotAvailable,

    #[error("Invalid appointment time: {0}")]
    InvalidTime(String),

    #[error("Past appointments only accept note changes")]
    PastAppointmentLocked,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<anyhow::Error> for AppointmentError {
    fn from(e: anyhow::Error) -> Self {
        AppointmentError::DatabaseError(e.to_string())
    }
}

impl From<DoctorError> for AppointmentError {
    fn from(e: DoctorError) -> Self {
        match e {
            DoctorError::NotFound => AppointmentError::DoctorNotFound,
            DoctorError::DatabaseError(msg) => AppointmentError::DatabaseError(msg),
            other => AppointmentError::ValidationError(other.to_string()),
        }
    }
}

impl From<AppointmentError> for AppError {
    fn from(e: AppointmentError) -> Self {
        match e {
            AppointmentError::NotFound | AppointmentError::DoctorNotFound => {
                AppError::NotFound(e.to_string())
            }
            AppointmentError::SlotNotAvailable => AppError::Conflict(e.to_string()),
            AppointmentError::InvalidTime(_) | AppointmentError::PastAppointmentLocked => {
                AppError::BadRequest(e.to_string())
            }
            AppointmentError::ValidationError(msg) => AppError::ValidationError(msg),
            AppointmentError::DatabaseError(msg) => AppError::Database(msg),
        }
    }
}
