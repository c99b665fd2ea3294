use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,
    pub exp: Option<u64>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub app_metadata: Option<serde_json::Value>,
    pub user_metadata: Option<serde_json::Value>,
    pub aud: Option<String>,
    pub iat: Option<u64>,
}

/// Authenticated principal placed in request extensions by the auth middleware.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: Option<String>,
    pub role: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub valid: bool,
    pub user_id: String,
    pub email: Option<String>,
    pub role: Option<String>,
}

/// Role flags stored on every user record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleFlags {
    #[serde(default)]
    pub is_patient: bool,
    #[serde(default)]
    pub is_hospital_admin: bool,
    #[serde(default)]
    pub is_system_admin: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsoleAccess {
    SystemAdmin,
    HospitalAdminUnsupported,
    NotAnAdmin,
}

impl RoleFlags {
    /// Only a pure system admin may use the administration console.
    pub fn console_access(&self) -> ConsoleAccess {
        match (self.is_system_admin, self.is_hospital_admin, self.is_patient) {
            (true, false, false) => ConsoleAccess::SystemAdmin,
            (false, true, false) => ConsoleAccess::HospitalAdminUnsupported,
            _ => ConsoleAccess::NotAnAdmin,
        }
    }
}
