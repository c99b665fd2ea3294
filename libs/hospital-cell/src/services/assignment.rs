use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info};

use shared_config::AppConfig;
use shared_database::supabase::{upsert_representation, SupabaseClient};

use crate::models::{HospitalAssignment, HospitalError};
use crate::services::HospitalService;

const ASSIGNMENTS_TABLE: &str = "/rest/v1/hospital_admin_assignments";

pub struct AssignmentService {
    supabase: SupabaseClient,
    hospitals: HospitalService,
}

impl AssignmentService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            hospitals: HospitalService::new(config),
        }
    }

    pub async fn list_assignments(&self, auth_token: &str) -> Result<Vec<HospitalAssignment>, HospitalError> {
        debug!("Listing hospital admin assignments");

        let path = format!("{}?select=user_id,hospital_id", ASSIGNMENTS_TABLE);
        let result: Vec<Value> = self.supabase.request(Method::GET, &path, Some(auth_token), None).await?;

        result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<HospitalAssignment>, _>>()
            .map_err(|e| HospitalError::DatabaseError(e.to_string()))
    }

    /// The hospital assigned to `user_id`, if any.
    pub async fn assigned_hospital_id(&self, user_id: &str, auth_token: &str) -> Result<Option<String>, HospitalError> {
        let path = format!(
            "{}?user_id=eq.{}&select=user_id,hospital_id",
            ASSIGNMENTS_TABLE,
            urlencoding::encode(user_id)
        );
        let result: Vec<HospitalAssignment> = self.supabase.request(Method::GET, &path, Some(auth_token), None).await?;

        Ok(result.into_iter().next().map(|assignment| assignment.hospital_id))
    }

    /// Assigns an existing hospital to the user, replacing any earlier assignment.
    pub async fn set_assignment(
        &self,
        user_id: &str,
        hospital_id: &str,
        auth_token: &str,
    ) -> Result<HospitalAssignment, HospitalError> {
        if hospital_id.trim().is_empty() {
            return Err(HospitalError::ValidationError("hospital_id is required".to_string()));
        }
        debug!("Assigning hospital {} to user {}", hospital_id, user_id);
        self.hospitals.get_hospital(hospital_id, auth_token).await?;

        let assignment = HospitalAssignment {
            user_id: user_id.to_string(),
            hospital_id: hospital_id.to_string(),
        };
        let path = format!("{}?on_conflict=user_id", ASSIGNMENTS_TABLE);
        let result: Vec<HospitalAssignment> = self.supabase.request_with_headers(
            Method::POST,
            &path,
            Some(auth_token),
            Some(json!(assignment)),
            Some(upsert_representation()),
        ).await?;

        let stored = result.into_iter().next().unwrap_or(assignment);
        info!("Hospital {} assigned to user {}", stored.hospital_id, stored.user_id);
        Ok(stored)
    }

    pub async fn delete_assignment(&self, user_id: &str, auth_token: &str) -> Result<(), HospitalError> {
        let path = format!("{}?user_id=eq.{}", ASSIGNMENTS_TABLE, urlencoding::encode(user_id));
        self.supabase.request_no_content(Method::DELETE, &path, Some(auth_token), None).await?;

        info!("Hospital assignment removed for user {}", user_id);
        Ok(())
    }
}
