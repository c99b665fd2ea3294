use std::ops::{Index, IndexMut};

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared_database::storage::StorageError;
use shared_models::error::AppError;
use shared_utils::time_mapping::GridTime;

// ==============================================================================
// OFFICE HOURS
// ==============================================================================

/// Weekday key for office hours. Monday is index 0 and Sunday index 6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl DayOfWeek {
    pub const ALL: [DayOfWeek; 7] = [
        DayOfWeek::Monday,
        DayOfWeek::Tuesday,
        DayOfWeek::Wednesday,
        DayOfWeek::Thursday,
        DayOfWeek::Friday,
        DayOfWeek::Saturday,
        DayOfWeek::Sunday,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Remaps a Sunday-first day number (0 = Sunday, 6 = Saturday) so Sunday lands last.
    pub fn from_sunday_first(day: u32) -> Option<Self> {
        if day > 6 {
            return None;
        }
        Self::from_index(((day + 6) % 7) as usize)
    }

    pub fn from_date(date: NaiveDate) -> Self {
        match date.weekday() {
            Weekday::Mon => DayOfWeek::Monday,
            Weekday::Tue => DayOfWeek::Tuesday,
            Weekday::Wed => DayOfWeek::Wednesday,
            Weekday::Thu => DayOfWeek::Thursday,
            Weekday::Fri => DayOfWeek::Friday,
            Weekday::Sat => DayOfWeek::Saturday,
            Weekday::Sun => DayOfWeek::Sunday,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            DayOfWeek::Monday => "monday",
            DayOfWeek::Tuesday => "tuesday",
            DayOfWeek::Wednesday => "wednesday",
            DayOfWeek::Thursday => "thursday",
            DayOfWeek::Friday => "friday",
            DayOfWeek::Saturday => "saturday",
            DayOfWeek::Sunday => "sunday",
        }
    }
}

/// One weekday's office hours. Times are canonical "HH:MM" strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySchedule {
    pub available: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
}

impl DaySchedule {
    pub fn closed() -> Self {
        Self::default()
    }

    pub fn open(start_time: &str, end_time: &str) -> Self {
        Self {
            available: true,
            start_time: Some(start_time.to_string()),
            end_time: Some(end_time.to_string()),
        }
    }

    /// The (start, end) window when the day is bookable. Times on a closed day are ignored.
    pub fn window(&self) -> Option<(&str, &str)> {
        if !self.available {
            return None;
        }
        match (self.start_time.as_deref(), self.end_time.as_deref()) {
            (Some(start), Some(end)) => Some((start, end)),
            _ => None,
        }
    }

    fn normalized(self) -> Self {
        if self.available {
            self
        } else {
            Self::closed()
        }
    }
}

/// A doctor's weekly office hours, one entry per weekday.
///
/// Stored as seven named keys (`monday` … `sunday`); missing keys read as closed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "OfficeHoursRecord", into = "OfficeHoursRecord")]
pub struct OfficeHours {
    days: [DaySchedule; 7],
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct OfficeHoursRecord {
    #[serde(default)]
    monday: DaySchedule,
    #[serde(default)]
    tuesday: DaySchedule,
    #[serde(default)]
    wednesday: DaySchedule,
    #[serde(default)]
    thursday: DaySchedule,
    #[serde(default)]
    friday: DaySchedule,
    #[serde(default)]
    saturday: DaySchedule,
    #[serde(default)]
    sunday: DaySchedule,
}

impl From<OfficeHoursRecord> for OfficeHours {
    fn from(record: OfficeHoursRecord) -> Self {
        Self {
            days: [
                record.monday.normalized(),
                record.tuesday.normalized(),
                record.wednesday.normalized(),
                record.thursday.normalized(),
                record.friday.normalized(),
                record.saturday.normalized(),
                record.sunday.normalized(),
            ],
        }
    }
}

impl From<OfficeHours> for OfficeHoursRecord {
    fn from(hours: OfficeHours) -> Self {
        let [monday, tuesday, wednesday, thursday, friday, saturday, sunday] = hours.days;
        Self { monday, tuesday, wednesday, thursday, friday, saturday, sunday }
    }
}

impl Index<DayOfWeek> for OfficeHours {
    type Output = DaySchedule;

    fn index(&self, day: DayOfWeek) -> &DaySchedule {
        &self.days[day.index()]
    }
}

impl IndexMut<DayOfWeek> for OfficeHours {
    fn index_mut(&mut self, day: DayOfWeek) -> &mut DaySchedule {
        &mut self.days[day.index()]
    }
}

impl OfficeHours {
    /// Same window on Monday to Friday, closed at weekends.
    pub fn weekdays(start_time: &str, end_time: &str) -> Self {
        let mut hours = Self::default();
        for day in &DayOfWeek::ALL[..5] {
            hours[*day] = DaySchedule::open(start_time, end_time);
        }
        hours
    }

    pub fn with_day(mut self, day: DayOfWeek, schedule: DaySchedule) -> Self {
        self[day] = schedule.normalized();
        self
    }

    pub fn for_date(&self, date: NaiveDate) -> &DaySchedule {
        &self[DayOfWeek::from_date(date)]
    }

    pub fn iter(&self) -> impl Iterator<Item = (DayOfWeek, &DaySchedule)> + '_ {
        DayOfWeek::ALL.into_iter().map(move |day| (day, &self[day]))
    }

    /// Checks every open day has grid-aligned boundaries with start before end.
    pub fn validate(&self) -> Result<(), DoctorError> {
        for (day, schedule) in self.iter() {
            if !schedule.available {
                continue;
            }

            let (start, end) = schedule.window().ok_or_else(|| {
                DoctorError::InvalidOfficeHours(format!("{}: start and end times are required", day.key()))
            })?;

            let start = GridTime::from_24_hour(start).ok_or_else(|| {
                DoctorError::InvalidOfficeHours(format!("{}: start time {} is not on the half-hour grid", day.key(), start))
            })?;
            let end = GridTime::from_24_hour(end).ok_or_else(|| {
                DoctorError::InvalidOfficeHours(format!("{}: end time {} is not on the half-hour grid", day.key(), end))
            })?;

            if start >= end {
                return Err(DoctorError::InvalidOfficeHours(format!(
                    "{}: start time must be before end time",
                    day.key()
                )));
            }
        }
        Ok(())
    }
}

// ==============================================================================
// DOCTOR RECORDS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Doctor {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub degrees: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub profile_picture_uri: String,
    #[serde(default)]
    pub department_id: String,
    #[serde(default)]
    pub hospital_id: String,
    #[serde(default)]
    pub office_hours: OfficeHours,
}

/// Full doctor record as written by the console; office hours replace the stored ones wholesale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorRequest {
    pub name: String,
    #[serde(default)]
    pub degrees: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub profile_picture_uri: String,
    pub department_id: String,
    pub hospital_id: String,
    #[serde(default)]
    pub office_hours: OfficeHours,
}

impl DoctorRequest {
    pub fn validate(&self) -> Result<(), DoctorError> {
        if self.name.trim().is_empty() {
            return Err(DoctorError::ValidationError("Doctor name is required".to_string()));
        }
        if self.hospital_id.trim().is_empty() {
            return Err(DoctorError::ValidationError("Hospital is required".to_string()));
        }
        if self.department_id.trim().is_empty() {
            return Err(DoctorError::ValidationError("Department is required".to_string()));
        }
        self.office_hours.validate()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DoctorListQuery {
    pub hospital_id: Option<String>,
    pub exclude_id: Option<String>,
}

#[derive(Debug, Error)]
pub enum DoctorError {
    #[error("Doctor not found")]
    NotFound,

    #[error("Invalid office hours: {0}")]
    InvalidOfficeHours(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid photo: {0}")]
    InvalidPhoto(String),

    #[error("Photo storage error: {0}")]
    Storage(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<anyhow::Error> for DoctorError {
    fn from(e: anyhow::Error) -> Self {
        DoctorError::DatabaseError(e.to_string())
    }
}

impl From<StorageError> for DoctorError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::InvalidImage(msg) => DoctorError::InvalidPhoto(msg),
            StorageError::Backend(e) => DoctorError::Storage(e.to_string()),
        }
    }
}

impl From<DoctorError> for AppError {
    fn from(e: DoctorError) -> Self {
        match e {
            DoctorError::NotFound => AppError::NotFound(e.to_string()),
            DoctorError::InvalidOfficeHours(_) | DoctorError::ValidationError(_) => {
                AppError::ValidationError(e.to_string())
            }
            DoctorError::InvalidPhoto(msg) => AppError::BadRequest(msg),
            DoctorError::Storage(msg) => AppError::ExternalService(msg),
            DoctorError::DatabaseError(msg) => AppError::Database(msg),
        }
    }
}
