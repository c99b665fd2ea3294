use reqwest::Method;
use serde_json::{json, Map, Value};
use tracing::{debug, info, warn};

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{AccountCreated, AccountError, CreateAccountRequest, UpdateAccountRequest};

/// Identity provider accounts, managed through the auth admin API.
/// Callers must already have passed the system admin check.
pub struct AccountService {
    supabase: SupabaseClient,
}

impl AccountService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn create_account(&self, request: CreateAccountRequest) -> Result<AccountCreated, AccountError> {
        request.validate()?;
        debug!("Creating auth account for {}", request.email);

        let body = json!({
            "email": request.email,
            "password": request.password,
            "email_confirm": true,
        });
        let created: Value = self.supabase.admin_request(Method::POST, "/auth/v1/admin/users", Some(body)).await?;

        let uid = created
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| AccountError::Provider("Account created without an id".to_string()))?
            .to_string();

        info!("Auth account created: {}", uid);
        Ok(AccountCreated { uid })
    }

    pub async fn update_account(&self, uid: &str, request: UpdateAccountRequest) -> Result<(), AccountError> {
        request.validate()?;
        debug!("Updating auth account {}", uid);

        let mut changes = Map::new();
        if let Some(email) = request.email() {
            changes.insert("email".to_string(), json!(email));
        }
        if let Some(password) = request.password() {
            changes.insert("password".to_string(), json!(password));
        }

        let path = format!("/auth/v1/admin/users/{}", urlencoding::encode(uid));
        let _: Value = self.supabase.admin_request(Method::PUT, &path, Some(Value::Object(changes))).await?;

        info!("Auth account updated: {}", uid);
        Ok(())
    }

    pub async fn delete_account(&self, uid: &str) -> Result<(), AccountError> {
        let path = format!("/auth/v1/admin/users/{}", urlencoding::encode(uid));
        let _: Value = self.supabase.admin_request(Method::DELETE, &path, None).await.map_err(|e| {
            warn!("Failed to delete auth account {}: {}", uid, e);
            AccountError::from(e)
        })?;

        info!("Auth account deleted: {}", uid);
        Ok(())
    }
}
