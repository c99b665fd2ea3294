use std::collections::HashSet;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime, Timelike};
use reqwest::Method;
use serde_json::Value;
use tracing::{debug, warn};

use doctor_cell::models::{Doctor, OfficeHours};
use doctor_cell::services::DoctorService;
use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_utils::time_mapping::{self, GridTime, SLOT_MINUTES};

use crate::models::{Appointment, AppointmentError};

/// The appointment being edited: its own slot stays selectable on its own date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditingSlot<'a> {
    pub date: NaiveDate,
    pub start_time: &'a str,
}

impl<'a> From<&'a Appointment> for EditingSlot<'a> {
    fn from(appointment: &'a Appointment) -> Self {
        Self {
            date: appointment.date,
            start_time: &appointment.appointment_start_time,
        }
    }
}

fn minutes_of_day(time_24h: &str) -> Option<u32> {
    NaiveTime::parse_from_str(time_24h, "%H:%M")
        .ok()
        .map(|time| time.num_seconds_from_midnight() / 60)
}

/// Open slots, in display form and chronological order, for `date`.
///
/// Candidates start at the day's `start_time` and step by 30 minutes while the
/// start is strictly before `end_time`. Booked canonical times are removed;
/// ones that do not map onto the grid are ignored. A closed day, or a day
/// whose boundaries do not parse, yields no slots.
pub fn compute_available_slots<'b, I>(
    office_hours: &OfficeHours,
    date: NaiveDate,
    booked_start_times: I,
    editing: Option<EditingSlot<'_>>,
) -> Vec<&'static str>
where
    I: IntoIterator<Item = &'b str>,
{
    let Some((start_time, end_time)) = office_hours.for_date(date).window() else {
        return Vec::new();
    };
    let (Some(start), Some(end)) = (minutes_of_day(start_time), minutes_of_day(end_time)) else {
        return Vec::new();
    };

    let mut excluded: HashSet<&'static str> = booked_start_times
        .into_iter()
        .filter_map(time_mapping::to_12_hour)
        .collect();

    if let Some(editing) = editing.filter(|editing| editing.date == date) {
        if let Some(own_slot) = time_mapping::to_12_hour(editing.start_time) {
            excluded.remove(own_slot);
        }
    }

    (start..end)
        .step_by(SLOT_MINUTES as usize)
        .filter_map(GridTime::from_minutes)
        .map(GridTime::display)
        .filter(|slot| !excluded.contains(slot))
        .collect()
}

pub struct AvailabilityService {
    supabase: Arc<SupabaseClient>,
    doctor_service: DoctorService,
}

impl AvailabilityService {
    pub fn new(config: &AppConfig, supabase: Arc<SupabaseClient>) -> Self {
        Self {
            supabase,
            doctor_service: DoctorService::new(config),
        }
    }

    /// All appointments a doctor has on one date.
    pub async fn bookings_for(
        &self,
        doctor_id: &str,
        date: NaiveDate,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let path = format!(
            "/rest/v1/appointments?doctor_id=eq.{}&date=eq.{}",
            urlencoding::encode(doctor_id),
            date.format("%Y-%m-%d")
        );

        let rows: Vec<Value> = self.supabase.request(Method::GET, &path, Some(auth_token), None).await?;

        let mut bookings = Vec::with_capacity(rows.len());
        for row in rows {
            match serde_json::from_value::<Appointment>(row) {
                Ok(appointment) => bookings.push(appointment),
                Err(e) => warn!("Skipping malformed appointment row for doctor {}: {}", doctor_id, e),
            }
        }
        Ok(bookings)
    }

    /// Open display-form slots for a doctor on a date.
    pub async fn available_times(
        &self,
        doctor_id: &str,
        date: NaiveDate,
        editing: Option<&Appointment>,
        auth_token: &str,
    ) -> Result<Vec<&'static str>, AppointmentError> {
        let doctor = self.doctor_service.get_doctor(doctor_id, auth_token).await?;
        self.open_slots(&doctor, date, editing, auth_token).await
    }

    /// Same as `available_times` for an already loaded doctor.
    ///
    /// When `editing` belongs to this doctor its own slot is kept open.
    pub async fn open_slots(
        &self,
        doctor: &Doctor,
        date: NaiveDate,
        editing: Option<&Appointment>,
        auth_token: &str,
    ) -> Result<Vec<&'static str>, AppointmentError> {
        debug!("Computing availability for doctor {} on {}", doctor.id, date);

        let bookings = self.bookings_for(&doctor.id, date, auth_token).await?;

        let editing = editing
            .filter(|appointment| appointment.doctor_id == doctor.id)
            .map(EditingSlot::from);

        let slots = compute_available_slots(
            &doctor.office_hours,
            date,
            bookings.iter().map(|b| b.appointment_start_time.as_str()),
            editing,
        );

        debug!("Doctor {} has {} open slots on {}", doctor.id, slots.len(), date);
        Ok(slots)
    }

    pub fn doctors(&self) -> &DoctorService {
        &self.doctor_service
    }
}
