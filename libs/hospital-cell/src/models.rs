use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared_models::error::AppError;

// ==============================================================================
// HOSPITALS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hospital {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub street_address: String,
    #[serde(default)]
    pub neighborhood: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub postal_code: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub appointment_link: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HospitalRequest {
    pub name: String,
    #[serde(default)]
    pub street_address: String,
    #[serde(default)]
    pub neighborhood: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub postal_code: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub appointment_link: String,
}

impl HospitalRequest {
    pub fn validate(&self) -> Result<(), HospitalError> {
        if self.name.trim().is_empty() {
            return Err(HospitalError::ValidationError("Hospital name is required".to_string()));
        }
        Ok(())
    }

    pub fn into_hospital(self, id: String) -> Hospital {
        Hospital {
            id,
            name: self.name,
            street_address: self.street_address,
            neighborhood: self.neighborhood,
            city: self.city,
            postal_code: self.postal_code,
            country: self.country,
            appointment_link: self.appointment_link,
        }
    }
}

// ==============================================================================
// DEPARTMENTS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Department {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepartmentRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl DepartmentRequest {
    pub fn validate(&self) -> Result<(), HospitalError> {
        if self.name.trim().is_empty() {
            return Err(HospitalError::ValidationError("Department name is required".to_string()));
        }
        Ok(())
    }

    pub fn into_department(self, id: String) -> Department {
        Department {
            id,
            name: self.name,
            description: self.description,
        }
    }
}

/// `?exclude_id=` on list endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExcludeQuery {
    pub exclude_id: Option<String>,
}

// ==============================================================================
// HOSPITAL ADMIN ASSIGNMENTS
// ==============================================================================

/// At most one hospital per hospital admin, keyed by user id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HospitalAssignment {
    pub user_id: String,
    pub hospital_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignHospitalRequest {
    pub hospital_id: String,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Debug, Error)]
pub enum HospitalError {
    #[error("Hospital not found")]
    HospitalNotFound,

    #[error("Department not found")]
    DepartmentNotFound,

    #[error("No hospital assigned to this user")]
    AssignmentNotFound,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<anyhow::Error> for HospitalError {
    fn from(e: anyhow::Error) -> Self {
        HospitalError::DatabaseError(e.to_string())
    }
}

impl From<HospitalError> for AppError {
    fn from(e: HospitalError) -> Self {
        match e {
            HospitalError::HospitalNotFound
            | HospitalError::DepartmentNotFound
            | HospitalError::AssignmentNotFound => AppError::NotFound(e.to_string()),
            HospitalError::ValidationError(msg) => AppError::ValidationError(msg),
            HospitalError::DatabaseError(msg) => AppError::Database(msg),
        }
    }
}
