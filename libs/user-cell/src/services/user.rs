use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info};

use shared_config::AppConfig;
use shared_database::storage::{PhotoKind, PhotoStorage};
use shared_database::supabase::{return_representation, SupabaseClient};
use shared_models::media::PhotoUpload;

use crate::models::{UserError, UserListQuery, UserRecord, UserRecordRequest};

pub struct UserService {
    supabase: SupabaseClient,
    storage: PhotoStorage,
}

impl UserService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            storage: PhotoStorage::new(config),
        }
    }

    /// Lists user records by last then first name, leaving out excluded ids.
    pub async fn list_users(&self, query: &UserListQuery, auth_token: &str) -> Result<Vec<UserRecord>, UserError> {
        debug!("Listing users with filters: {:?}", query);

        let mut path = "/rest/v1/users?select=*".to_string();
        let excluded = query.excluded_ids();
        if !excluded.is_empty() {
            let ids: Vec<String> = excluded
                .iter()
                .map(|id| format!("\"{}\"", urlencoding::encode(id)))
                .collect();
            path.push_str(&format!("&id=not.in.({})", ids.join(",")));
        }
        path.push_str("&order=last_name.asc,first_name.asc");

        let result: Vec<Value> = self.supabase.request(Method::GET, &path, Some(auth_token), None).await?;

        result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<UserRecord>, _>>()
            .map_err(|e| UserError::DatabaseError(e.to_string()))
    }

    pub async fn get_user(&self, user_id: &str, auth_token: &str) -> Result<UserRecord, UserError> {
        debug!("Fetching user record: {}", user_id);

        let path = format!("/rest/v1/users?id=eq.{}", urlencoding::encode(user_id));
        let result: Vec<Value> = self.supabase.request(Method::GET, &path, Some(auth_token), None).await?;

        Self::first_row(result)
    }

    /// Writes the whole record for an existing user.
    pub async fn set_user(
        &self,
        user_id: &str,
        request: UserRecordRequest,
        auth_token: &str,
    ) -> Result<UserRecord, UserError> {
        request.validate()?;
        debug!("Writing user record: {}", user_id);

        let record = request.into_record(user_id.to_string());
        let path = format!("/rest/v1/users?id=eq.{}", urlencoding::encode(user_id));
        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::PATCH,
            &path,
            Some(auth_token),
            Some(json!(record)),
            Some(return_representation()),
        ).await?;

        let updated = Self::first_row(result)?;
        info!("User record updated: {}", updated.id);
        Ok(updated)
    }

    pub async fn delete_user(&self, user_id: &str, auth_token: &str) -> Result<(), UserError> {
        debug!("Deleting user record: {}", user_id);

        let path = format!("/rest/v1/users?id=eq.{}", urlencoding::encode(user_id));
        self.supabase.request_no_content(Method::DELETE, &path, Some(auth_token), None).await?;

        info!("User record deleted: {}", user_id);
        Ok(())
    }

    pub async fn set_user_photo(
        &self,
        user_id: &str,
        upload: PhotoUpload,
        auth_token: &str,
    ) -> Result<String, UserError> {
        self.get_user(user_id, auth_token).await?;

        let url = self.storage
            .set_photo(PhotoKind::User, user_id, &upload.image_data, &upload.content_type, auth_token)
            .await?;

        self.set_profile_picture_uri(user_id, &url, auth_token).await?;
        Ok(url)
    }

    pub async fn delete_user_photo(&self, user_id: &str, auth_token: &str) -> Result<(), UserError> {
        self.storage
            .delete_photo(PhotoKind::User, user_id, auth_token)
            .await?;

        self.set_profile_picture_uri(user_id, "", auth_token).await
    }

    async fn set_profile_picture_uri(&self, user_id: &str, uri: &str, auth_token: &str) -> Result<(), UserError> {
        let path = format!("/rest/v1/users?id=eq.{}", urlencoding::encode(user_id));
        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::PATCH,
            &path,
            Some(auth_token),
            Some(json!({ "profile_picture_uri": uri })),
            Some(return_representation()),
        ).await?;

        if result.is_empty() {
            return Err(UserError::NotFound);
        }
        Ok(())
    }

    fn first_row(rows: Vec<Value>) -> Result<UserRecord, UserError> {
        let record = rows.into_iter().next().ok_or(UserError::NotFound)?;
        serde_json::from_value(record).map_err(|e| UserError::DatabaseError(e.to_string()))
    }
}
