use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::{return_representation, SupabaseClient};

use crate::models::{Department, DepartmentRequest, ExcludeQuery, HospitalError};

pub struct DepartmentService {
    supabase: SupabaseClient,
}

impl DepartmentService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn list_departments(&self, query: &ExcludeQuery, auth_token: &str) -> Result<Vec<Department>, HospitalError> {
        debug!("Listing departments with filters: {:?}", query);

        let mut path = "/rest/v1/departments?select=*".to_string();
        if let Some(exclude_id) = &query.exclude_id {
            path.push_str(&format!("&id=neq.{}", urlencoding::encode(exclude_id)));
        }
        path.push_str("&order=name.asc");

        let result: Vec<Value> = self.supabase.request(Method::GET, &path, Some(auth_token), None).await?;

        result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Department>, _>>()
            .map_err(|e| HospitalError::DatabaseError(e.to_string()))
    }

    pub async fn get_department(&self, department_id: &str, auth_token: &str) -> Result<Department, HospitalError> {
        let path = format!("/rest/v1/departments?id=eq.{}", urlencoding::encode(department_id));
        let result: Vec<Value> = self.supabase.request(Method::GET, &path, Some(auth_token), None).await?;

        Self::first_row(result)
    }

    pub async fn add_department(&self, request: DepartmentRequest, auth_token: &str) -> Result<Department, HospitalError> {
        request.validate()?;

        let department = request.into_department(Uuid::new_v4().simple().to_string());
        debug!("Adding department {} ({})", department.name, department.id);

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/departments",
            Some(auth_token),
            Some(json!(department)),
            Some(return_representation()),
        ).await?;

        let created = Self::first_row(result)?;
        info!("Department added: {}", created.id);
        Ok(created)
    }

    pub async fn set_department(
        &self,
        department_id: &str,
        request: DepartmentRequest,
        auth_token: &str,
    ) -> Result<Department, HospitalError> {
        request.validate()?;

        let department = request.into_department(department_id.to_string());
        let path = format!("/rest/v1/departments?id=eq.{}", urlencoding::encode(department_id));
        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::PATCH,
            &path,
            Some(auth_token),
            Some(json!(department)),
            Some(return_representation()),
        ).await?;

        let updated = Self::first_row(result)?;
        info!("Department updated: {}", updated.id);
        Ok(updated)
    }

    pub async fn delete_department(&self, department_id: &str, auth_token: &str) -> Result<(), HospitalError> {
        let path = format!("/rest/v1/departments?id=eq.{}", urlencoding::encode(department_id));
        self.supabase.request_no_content(Method::DELETE, &path, Some(auth_token), None).await?;

        info!("Department deleted: {}", department_id);
        Ok(())
    }

    fn first_row(rows: Vec<Value>) -> Result<Department, HospitalError> {
        let record = rows.into_iter().next().ok_or(HospitalError::DepartmentNotFound)?;
        serde_json::from_value(record).map_err(|e| HospitalError::DatabaseError(e.to_string()))
    }
}
