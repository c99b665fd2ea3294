use serde::{Deserialize, Serialize};

use shared_models::auth::{ConsoleAccess, RoleFlags};

/// The slice of a `users` row needed to authorize console access.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrincipalRecord {
    pub id: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(flatten)]
    pub roles: RoleFlags,
}

/// What the console needs after sign-in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionProfile {
    pub user_id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(flatten)]
    pub roles: RoleFlags,
    pub console_access: ConsoleAccess,
}

impl From<PrincipalRecord> for SessionProfile {
    fn from(record: PrincipalRecord) -> Self {
        Self {
            console_access: record.roles.console_access(),
            user_id: record.id,
            email: record.email,
            first_name: record.first_name,
            last_name: record.last_name,
            roles: record.roles,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn session_reports_flags_and_access() {
        let record: PrincipalRecord = serde_json::from_value(json!({
            "id": "u1",
            "first_name": "Grace",
            "last_name": "Hopper",
            "email": "grace@example.com",
            "is_system_admin": true
        }))
        .unwrap();

        let value = serde_json::to_value(SessionProfile::from(record)).unwrap();
        assert_eq!(value["user_id"], "u1");
        assert_eq!(value["is_system_admin"], true);
        assert_eq!(value["is_patient"], false);
        assert_eq!(value["console_access"], "system_admin");
    }
}
