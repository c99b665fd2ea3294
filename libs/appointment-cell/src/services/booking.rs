use std::sync::Arc;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use doctor_cell::models::Doctor;
use shared_config::AppConfig;
use shared_database::supabase::{return_representation, SupabaseClient};
use shared_utils::time_mapping;

use crate::models::{
    upcoming_cutoff,
    Appointment, AppointmentError, AppointmentPhase, AvailabilityQuery,
    BookAppointmentRequest, UpdateAppointmentRequest,
};
use crate::services::availability::AvailabilityService;

pub struct AppointmentBookingService {
    supabase: Arc<SupabaseClient>,
    availability_service: AvailabilityService,
    upcoming_buffer: Duration,
}

impl AppointmentBookingService {
    pub fn new(config: &AppConfig) -> Self {
        let supabase = Arc::new(SupabaseClient::new(config));
        let availability_service = AvailabilityService::new(config, Arc::clone(&supabase));

        Self {
            supabase,
            availability_service,
            upcoming_buffer: Duration::minutes(config.effective_upcoming_buffer_minutes()),
        }
    }

    pub async fn get_appointment(
        &self,
        appointment_id: &str,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        debug!("Fetching appointment: {}", appointment_id);

        let path = format!("/rest/v1/appointments?id=eq.{}", urlencoding::encode(appointment_id));
        let result: Vec<Value> = self.supabase.request(Method::GET, &path, Some(auth_token), None).await?;

        Self::first_row(result)
    }

    /// Open slots for the picker, keeping the edited appointment's own slot selectable.
    pub async fn available_times(
        &self,
        query: &AvailabilityQuery,
        auth_token: &str,
    ) -> Result<Vec<&'static str>, AppointmentError> {
        let editing = match &query.editing_appointment_id {
            Some(id) => Some(self.get_appointment(id, auth_token).await?),
            None => None,
        };

        self.availability_service
            .available_times(&query.doctor_id, query.date, editing.as_ref(), auth_token)
            .await
    }

    pub async fn book_appointment(
        &self,
        request: BookAppointmentRequest,
        now: NaiveDateTime,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        info!("Booking appointment for user {} with doctor {} on {} at {}",
              request.user_id, request.doctor_id, request.date, request.appointment_time);

        Self::validate_parties(&request.user_id, &request.doctor_id)?;
        Self::validate_date(request.date, now)?;
        let canonical = Self::canonical_time(&request.appointment_time)?;

        let doctor = self.doctor_for_hospital(&request.doctor_id, &request.hospital_id, auth_token).await?;
        self.ensure_slot_open(&doctor, request.date, &request.appointment_time, None, auth_token).await?;

        let appointment = Appointment {
            id: Uuid::new_v4().simple().to_string(),
            user_id: request.user_id,
            doctor_id: doctor.id,
            hospital_id: request.hospital_id,
            department_id: doctor.department_id,
            date: request.date,
            appointment_start_time: canonical.to_string(),
            reason_for_visit: request.reason_for_visit,
            appointment_notes: request.appointment_notes,
        };

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/appointments",
            Some(auth_token),
            Some(json!(appointment)),
            Some(return_representation()),
        ).await.map_err(Self::slot_write_error)?;

        let created = Self::first_row(result)?;
        info!("Appointment {} booked", created.id);
        Ok(created)
    }

    /// Rewrites an upcoming appointment. Past appointments only accept a notes change.
    pub async fn update_appointment(
        &self,
        appointment_id: &str,
        request: UpdateAppointmentRequest,
        now: NaiveDateTime,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        debug!("Updating appointment: {}", appointment_id);

        let existing = self.get_appointment(appointment_id, auth_token).await?;

        if existing.phase(upcoming_cutoff(now, self.upcoming_buffer)) == AppointmentPhase::Past {
            if Self::changes_schedule(&existing, &request) {
                warn!("Rejected schedule change to past appointment {}", appointment_id);
                return Err(AppointmentError::PastAppointmentLocked);
            }
            return self.update_notes(appointment_id, &request.appointment_notes, auth_token).await;
        }

        Self::validate_parties(&request.user_id, &request.doctor_id)?;
        Self::validate_date(request.date, now)?;
        let canonical = Self::canonical_time(&request.appointment_time)?;

        let doctor = self.doctor_for_hospital(&request.doctor_id, &request.hospital_id, auth_token).await?;
        self.ensure_slot_open(&doctor, request.date, &request.appointment_time, Some(&existing), auth_token).await?;

        let updated = Appointment {
            id: existing.id,
            user_id: request.user_id,
            doctor_id: doctor.id,
            hospital_id: request.hospital_id,
            department_id: doctor.department_id,
            date: request.date,
            appointment_start_time: canonical.to_string(),
            reason_for_visit: request.reason_for_visit,
            appointment_notes: request.appointment_notes,
        };

        let path = format!("/rest/v1/appointments?id=eq.{}", urlencoding::encode(appointment_id));
        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::PATCH,
            &path,
            Some(auth_token),
            Some(json!(updated)),
            Some(return_representation()),
        ).await.map_err(Self::slot_write_error)?;

        let saved = Self::first_row(result)?;
        info!("Appointment {} updated", saved.id);
        Ok(saved)
    }

    pub async fn update_notes(
        &self,
        appointment_id: &str,
        notes: &str,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        debug!("Updating notes on appointment: {}", appointment_id);

        let path = format!("/rest/v1/appointments?id=eq.{}", urlencoding::encode(appointment_id));
        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::PATCH,
            &path,
            Some(auth_token),
            Some(json!({ "appointment_notes": notes })),
            Some(return_representation()),
        ).await?;

        Self::first_row(result)
    }

    pub async fn delete_appointment(&self, appointment_id: &str, auth_token: &str) -> Result<(), AppointmentError> {
        debug!("Deleting appointment: {}", appointment_id);

        let path = format!("/rest/v1/appointments?id=eq.{}", urlencoding::encode(appointment_id));
        self.supabase.request_no_content(Method::DELETE, &path, Some(auth_token), None).await?;

        info!("Appointment {} deleted", appointment_id);
        Ok(())
    }

    async fn doctor_for_hospital(
        &self,
        doctor_id: &str,
        hospital_id: &str,
        auth_token: &str,
    ) -> Result<Doctor, AppointmentError> {
        let doctor = self.availability_service.doctors().get_doctor(doctor_id, auth_token).await?;
        if doctor.hospital_id != hospital_id {
            return Err(AppointmentError::ValidationError(format!(
                "Doctor {} does not practice at hospital {}",
                doctor_id, hospital_id
            )));
        }
        Ok(doctor)
    }

    async fn ensure_slot_open(
        &self,
        doctor: &Doctor,
        date: NaiveDate,
        display_time: &str,
        editing: Option<&Appointment>,
        auth_token: &str,
    ) -> Result<(), AppointmentError> {
        let open = self.availability_service.open_slots(doctor, date, editing, auth_token).await?;
        if !open.iter().any(|slot| *slot == display_time) {
            warn!("Slot {} on {} is not open for doctor {}", display_time, date, doctor.id);
            return Err(AppointmentError::SlotNotAvailable);
        }
        Ok(())
    }

    fn validate_parties(user_id: &str, doctor_id: &str) -> Result<(), AppointmentError> {
        if user_id.trim().is_empty() {
            return Err(AppointmentError::ValidationError("Patient is required".to_string()));
        }
        if doctor_id.trim().is_empty() {
            return Err(AppointmentError::ValidationError("Doctor is required".to_string()));
        }
        Ok(())
    }

    fn validate_date(date: NaiveDate, now: NaiveDateTime) -> Result<(), AppointmentError> {
        if date < now.date() {
            return Err(AppointmentError::InvalidTime(format!("{} is in the past", date)));
        }
        Ok(())
    }

    fn canonical_time(display_time: &str) -> Result<&'static str, AppointmentError> {
        time_mapping::to_24_hour(display_time).ok_or_else(|| {
            AppointmentError::InvalidTime(format!("{} is not a bookable time", display_time))
        })
    }

    fn changes_schedule(existing: &Appointment, request: &UpdateAppointmentRequest) -> bool {
        let same_time = time_mapping::to_24_hour(&request.appointment_time)
            .map(|canonical| canonical == existing.appointment_start_time)
            .unwrap_or(request.appointment_time == existing.appointment_start_time);

        !(same_time
            && existing.user_id == request.user_id
            && existing.doctor_id == request.doctor_id
            && existing.hospital_id == request.hospital_id
            && existing.date == request.date
            && existing.reason_for_visit == request.reason_for_visit)
    }

    /// A concurrent booking that won the slot surfaces as a unique violation
    /// (`23505`) from the schedule index on doctor, date and start time.
    fn slot_write_error(e: anyhow::Error) -> AppointmentError {
        let message = e.to_string();
        if message.starts_with("Conflict:") || message.contains("23505") {
            warn!("Slot taken by a concurrent write: {}", message);
            return AppointmentError::SlotNotAvailable;
        }
        AppointmentError::from(e)
    }

    fn first_row(rows: Vec<Value>) -> Result<Appointment, AppointmentError> {
        let record = rows.into_iter().next().ok_or(AppointmentError::NotFound)?;
        serde_json::from_value(record).map_err(|e| AppointmentError::DatabaseError(e.to_string()))
    }
}
