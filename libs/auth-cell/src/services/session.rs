use anyhow::Result;
use reqwest::Method;
use tracing::{debug, warn};

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_models::auth::{RoleFlags, User};
use shared_models::error::AppError;

use crate::models::{PrincipalRecord, SessionProfile};

pub struct SessionService {
    supabase: SupabaseClient,
}

impl SessionService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    /// Loads the caller's `users` row, or `None` when the principal has no record.
    pub async fn principal(&self, user_id: &str, auth_token: &str) -> Result<Option<PrincipalRecord>> {
        debug!("Loading principal record for {}", user_id);

        let path = format!(
            "/rest/v1/users?id=eq.{}&select=id,first_name,last_name,email,is_patient,is_hospital_admin,is_system_admin",
            urlencoding::encode(user_id)
        );
        let rows: Vec<PrincipalRecord> = self.supabase.request(Method::GET, &path, Some(auth_token), None).await?;

        Ok(rows.into_iter().next())
    }

    pub async fn role_flags(&self, user_id: &str, auth_token: &str) -> Result<RoleFlags> {
        Ok(self
            .principal(user_id, auth_token)
            .await?
            .map(|record| record.roles)
            .unwrap_or_default())
    }

    pub async fn session(&self, user: &User, auth_token: &str) -> Result<Option<SessionProfile>> {
        Ok(self.principal(&user.id, auth_token).await?.map(SessionProfile::from))
    }

    /// Fails with `Forbidden` unless the caller's own record says system admin.
    pub async fn require_system_admin(&self, user: &User, auth_token: &str) -> Result<(), AppError> {
        let roles = self
            .role_flags(&user.id, auth_token)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if !roles.is_system_admin {
            warn!("User {} attempted a system admin operation", user.id);
            return Err(AppError::Forbidden(
                "Only system administrators can manage accounts".to_string(),
            ));
        }
        Ok(())
    }
}
