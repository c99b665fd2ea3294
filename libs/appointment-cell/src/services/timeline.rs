use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, NaiveDateTime};
use reqwest::Method;
use serde_json::Value;
use tracing::{debug, warn};

use doctor_cell::models::{Doctor, DoctorListQuery};
use doctor_cell::services::DoctorService;
use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{
    upcoming_cutoff,
    Appointment, AppointmentError, AppointmentListing, AppointmentPhase,
    PastAppointmentFilters, PatientSummary,
};

/// Splits appointments into upcoming and past around `now + buffer`.
pub struct AppointmentTimelineService {
    supabase: Arc<SupabaseClient>,
    doctor_service: DoctorService,
    upcoming_buffer: Duration,
}

impl AppointmentTimelineService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
            doctor_service: DoctorService::new(config),
            upcoming_buffer: Duration::minutes(config.effective_upcoming_buffer_minutes()),
        }
    }

    pub fn cutoff(&self, now: NaiveDateTime) -> NaiveDateTime {
        upcoming_cutoff(now, self.upcoming_buffer)
    }

    pub async fn upcoming(
        &self,
        now: NaiveDateTime,
        auth_token: &str,
    ) -> Result<Vec<AppointmentListing>, AppointmentError> {
        let cutoff = self.cutoff(now);
        debug!("Listing appointments starting at or after {}", cutoff);

        let path = format!(
            "/rest/v1/appointments?date=gte.{}",
            cutoff.date().format("%Y-%m-%d")
        );
        self.listing(&path, cutoff, AppointmentPhase::Upcoming, auth_token).await
    }

    pub async fn past(
        &self,
        filters: &PastAppointmentFilters,
        now: NaiveDateTime,
        auth_token: &str,
    ) -> Result<Vec<AppointmentListing>, AppointmentError> {
        let cutoff = self.cutoff(now);
        debug!("Listing appointments starting before {} with filters {:?}", cutoff, filters);

        let mut path = format!(
            "/rest/v1/appointments?date=lte.{}",
            cutoff.date().format("%Y-%m-%d")
        );
        if let Some(doctor_id) = &filters.doctor_id {
            path.push_str(&format!("&doctor_id=eq.{}", urlencoding::encode(doctor_id)));
        }
        if let Some(user_id) = &filters.user_id {
            path.push_str(&format!("&user_id=eq.{}", urlencoding::encode(user_id)));
        }
        if let Some(hospital_id) = &filters.hospital_id {
            path.push_str(&format!("&hospital_id=eq.{}", urlencoding::encode(hospital_id)));
        }
        if let Some(date) = filters.date {
            path.push_str(&format!("&date=eq.{}", date.format("%Y-%m-%d")));
        }

        self.listing(&path, cutoff, AppointmentPhase::Past, auth_token).await
    }

    async fn listing(
        &self,
        appointments_path: &str,
        cutoff: NaiveDateTime,
        phase: AppointmentPhase,
        auth_token: &str,
    ) -> Result<Vec<AppointmentListing>, AppointmentError> {
        let all_doctors = DoctorListQuery::default();

        let (appointments, doctors, patients) = futures::try_join!(
            self.fetch_appointments(appointments_path, auth_token),
            async {
                self.doctor_service
                    .list_doctors(&all_doctors, auth_token)
                    .await
                    .map_err(AppointmentError::from)
            },
            self.fetch_patients(auth_token),
        )?;

        Ok(build_listings(appointments, &doctors, &patients, cutoff, phase))
    }

    async fn fetch_appointments(&self, path: &str, auth_token: &str) -> Result<Vec<Appointment>, AppointmentError> {
        let rows: Vec<Value> = self.supabase.request(Method::GET, path, Some(auth_token), None).await?;
        Ok(rows
            .into_iter()
            .filter_map(|row| match serde_json::from_value(row) {
                Ok(appointment) => Some(appointment),
                Err(e) => {
                    warn!("Skipping malformed appointment row: {}", e);
                    None
                }
            })
            .collect())
    }

    async fn fetch_patients(&self, auth_token: &str) -> Result<Vec<PatientSummary>, AppointmentError> {
        let rows: Vec<PatientSummary> = self.supabase.request(
            Method::GET,
            "/rest/v1/users?select=id,first_name,last_name,email",
            Some(auth_token),
            None,
        ).await?;
        Ok(rows)
    }
}

/// Joins appointments with their doctor and patient and keeps those in `phase`.
///
/// Rows whose doctor or patient no longer exists are skipped. Output is sorted
/// by doctor name (case-insensitive), then date, then start time.
pub fn build_listings(
    appointments: Vec<Appointment>,
    doctors: &[Doctor],
    patients: &[PatientSummary],
    cutoff: NaiveDateTime,
    phase: AppointmentPhase,
) -> Vec<AppointmentListing> {
    let doctors: HashMap<&str, &Doctor> = doctors.iter().map(|d| (d.id.as_str(), d)).collect();
    let patients: HashMap<&str, &PatientSummary> = patients.iter().map(|p| (p.id.as_str(), p)).collect();

    let mut listings: Vec<AppointmentListing> = appointments
        .into_iter()
        .filter(|appointment| appointment.phase(cutoff) == phase)
        .filter_map(|appointment| {
            let Some(doctor) = doctors.get(appointment.doctor_id.as_str()) else {
                debug!("Skipping appointment {}: doctor {} missing", appointment.id, appointment.doctor_id);
                return None;
            };
            let Some(patient) = patients.get(appointment.user_id.as_str()) else {
                debug!("Skipping appointment {}: user {} missing", appointment.id, appointment.user_id);
                return None;
            };

            Some(AppointmentListing {
                display_time: appointment.display_time(),
                doctor_name: doctor.name.clone(),
                patient: (*patient).clone(),
                phase,
                appointment,
            })
        })
        .collect();

    listings.sort_by_cached_key(|listing| {
        (
            listing.doctor_name.to_lowercase(),
            listing.appointment.date,
            listing.appointment.appointment_start_time.clone(),
        )
    });
    listings
}
