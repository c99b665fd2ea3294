use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::storage::{PhotoKind, PhotoStorage};
use shared_database::supabase::{return_representation, SupabaseClient};
use shared_models::media::PhotoUpload;

use crate::models::{Doctor, DoctorError, DoctorListQuery, DoctorRequest};

pub struct DoctorService {
    supabase: SupabaseClient,
    storage: PhotoStorage,
}

impl DoctorService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            storage: PhotoStorage::new(config),
        }
    }

    /// List doctors ordered by name, optionally limited to one hospital.
    pub async fn list_doctors(
        &self,
        query: &DoctorListQuery,
        auth_token: &str,
    ) -> Result<Vec<Doctor>, DoctorError> {
        debug!("Listing doctors with filters: {:?}", query);

        let mut path = "/rest/v1/doctors?select=*".to_string();
        if let Some(hospital_id) = &query.hospital_id {
            path.push_str(&format!("&hospital_id=eq.{}", urlencoding::encode(hospital_id)));
        }
        if let Some(exclude_id) = &query.exclude_id {
            path.push_str(&format!("&id=neq.{}", urlencoding::encode(exclude_id)));
        }
        path.push_str("&order=name.asc");

        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await?;

        let mut doctors = result.into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Doctor>, _>>()
            .map_err(|e| DoctorError::DatabaseError(e.to_string()))?;

        // The store orders by byte value; the console lists case-insensitively.
        doctors.sort_by_key(|doctor| doctor.name.to_lowercase());
        Ok(doctors)
    }

    pub async fn get_doctor(
        &self,
        doctor_id: &str,
        auth_token: &str,
    ) -> Result<Doctor, DoctorError> {
        debug!("Fetching doctor: {}", doctor_id);

        let path = format!("/rest/v1/doctors?id=eq.{}", urlencoding::encode(doctor_id));
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await?;

        let record = result.into_iter().next().ok_or(DoctorError::NotFound)?;
        serde_json::from_value(record).map_err(|e| DoctorError::DatabaseError(e.to_string()))
    }

    pub async fn create_doctor(
        &self,
        request: DoctorRequest,
        auth_token: &str,
    ) -> Result<Doctor, DoctorError> {
        request.validate()?;

        let id = Uuid::new_v4().simple().to_string();
        debug!("Creating doctor {} ({})", request.name, id);

        let doctor = Self::to_doctor(id, request);
        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/doctors",
            Some(auth_token),
            Some(json!(doctor)),
            Some(return_representation()),
        ).await?;

        let created = Self::first_row(result)?;
        info!("Doctor created: {}", created.id);
        Ok(created)
    }

    /// Replaces the whole doctor record, office hours included.
    pub async fn update_doctor(
        &self,
        doctor_id: &str,
        request: DoctorRequest,
        auth_token: &str,
    ) -> Result<Doctor, DoctorError> {
        request.validate()?;
        debug!("Updating doctor: {}", doctor_id);

        let doctor = Self::to_doctor(doctor_id.to_string(), request);
        let path = format!("/rest/v1/doctors?id=eq.{}", urlencoding::encode(doctor_id));
        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::PATCH,
            &path,
            Some(auth_token),
            Some(json!(doctor)),
            Some(return_representation()),
        ).await?;

        let updated = Self::first_row(result)?;
        info!("Doctor updated: {}", updated.id);
        Ok(updated)
    }

    pub async fn delete_doctor(&self, doctor_id: &str, auth_token: &str) -> Result<(), DoctorError> {
        debug!("Deleting doctor: {}", doctor_id);

        let path = format!("/rest/v1/doctors?id=eq.{}", urlencoding::encode(doctor_id));
        self.supabase.request_no_content(Method::DELETE, &path, Some(auth_token), None).await?;

        info!("Doctor deleted: {}", doctor_id);
        Ok(())
    }

    /// Stores the photo under the doctor's id and records its URL on the doctor.
    pub async fn set_doctor_photo(
        &self,
        doctor_id: &str,
        upload: PhotoUpload,
        auth_token: &str,
    ) -> Result<String, DoctorError> {
        self.get_doctor(doctor_id, auth_token).await?;

        let url = self.storage
            .set_photo(PhotoKind::Doctor, doctor_id, &upload.image_data, &upload.content_type, auth_token)
            .await?;

        self.set_profile_picture_uri(doctor_id, &url, auth_token).await?;
        Ok(url)
    }

    pub async fn delete_doctor_photo(&self, doctor_id: &str, auth_token: &str) -> Result<(), DoctorError> {
        self.storage
            .delete_photo(PhotoKind::Doctor, doctor_id, auth_token)
            .await?;

        self.set_profile_picture_uri(doctor_id, "", auth_token).await
    }

    async fn set_profile_picture_uri(&self, doctor_id: &str, uri: &str, auth_token: &str) -> Result<(), DoctorError> {
        let path = format!("/rest/v1/doctors?id=eq.{}", urlencoding::encode(doctor_id));
        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::PATCH,
            &path,
            Some(auth_token),
            Some(json!({ "profile_picture_uri": uri })),
            Some(return_representation()),
        ).await?;

        if result.is_empty() {
            return Err(DoctorError::NotFound);
        }
        Ok(())
    }

    fn to_doctor(id: String, request: DoctorRequest) -> Doctor {
        Doctor {
            id,
            name: request.name,
            degrees: request.degrees,
            phone_number: request.phone_number,
            profile_picture_uri: request.profile_picture_uri,
            department_id: request.department_id,
            hospital_id: request.hospital_id,
            office_hours: request.office_hours,
        }
    }

    fn first_row(rows: Vec<Value>) -> Result<Doctor, DoctorError> {
        let record = rows.into_iter().next().ok_or(DoctorError::NotFound)?;
        serde_json::from_value(record).map_err(|e| DoctorError::DatabaseError(e.to_string()))
    }
}
