use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::{return_representation, SupabaseClient};

use crate::models::{ExcludeQuery, Hospital, HospitalError, HospitalRequest};

pub struct HospitalService {
    supabase: SupabaseClient,
}

impl HospitalService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn list_hospitals(&self, query: &ExcludeQuery, auth_token: &str) -> Result<Vec<Hospital>, HospitalError> {
        debug!("Listing hospitals with filters: {:?}", query);

        let mut path = "/rest/v1/hospitals?select=*".to_string();
        if let Some(exclude_id) = &query.exclude_id {
            path.push_str(&format!("&id=neq.{}", urlencoding::encode(exclude_id)));
        }
        path.push_str("&order=name.asc");

        let result: Vec<Value> = self.supabase.request(Method::GET, &path, Some(auth_token), None).await?;

        result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Hospital>, _>>()
            .map_err(|e| HospitalError::DatabaseError(e.to_string()))
    }

    pub async fn get_hospital(&self, hospital_id: &str, auth_token: &str) -> Result<Hospital, HospitalError> {
        debug!("Fetching hospital: {}", hospital_id);

        let path = format!("/rest/v1/hospitals?id=eq.{}", urlencoding::encode(hospital_id));
        let result: Vec<Value> = self.supabase.request(Method::GET, &path, Some(auth_token), None).await?;

        Self::first_row(result)
    }

    pub async fn add_hospital(&self, request: HospitalRequest, auth_token: &str) -> Result<Hospital, HospitalError> {
        request.validate()?;

        let id = Uuid::new_v4().simple().to_string();
        debug!("Adding hospital {} ({})", request.name, id);

        let hospital = request.into_hospital(id);
        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/hospitals",
            Some(auth_token),
            Some(json!(hospital)),
            Some(return_representation()),
        ).await?;

        let created = Self::first_row(result)?;
        info!("Hospital added: {}", created.id);
        Ok(created)
    }

    pub async fn set_hospital(
        &self,
        hospital_id: &str,
        request: HospitalRequest,
        auth_token: &str,
    ) -> Result<Hospital, HospitalError> {
        request.validate()?;
        debug!("Setting hospital: {}", hospital_id);

        let hospital = request.into_hospital(hospital_id.to_string());
        let path = format!("/rest/v1/hospitals?id=eq.{}", urlencoding::encode(hospital_id));
        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::PATCH,
            &path,
            Some(auth_token),
            Some(json!(hospital)),
            Some(return_representation()),
        ).await?;

        let updated = Self::first_row(result)?;
        info!("Hospital updated: {}", updated.id);
        Ok(updated)
    }

    pub async fn delete_hospital(&self, hospital_id: &str, auth_token: &str) -> Result<(), HospitalError> {
        debug!("Deleting hospital: {}", hospital_id);

        let path = format!("/rest/v1/hospitals?id=eq.{}", urlencoding::encode(hospital_id));
        self.supabase.request_no_content(Method::DELETE, &path, Some(auth_token), None).await?;

        info!("Hospital deleted: {}", hospital_id);
        Ok(())
    }

    fn first_row(rows: Vec<Value>) -> Result<Hospital, HospitalError> {
        let record = rows.into_iter().next().ok_or(HospitalError::HospitalNotFound)?;
        serde_json::from_value(record).map_err(|e| HospitalError::DatabaseError(e.to_string()))
    }
}
