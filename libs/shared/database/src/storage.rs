use anyhow::Result;
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use reqwest::Method;
use thiserror::Error;
use tracing::{debug, info};

use shared_config::AppConfig;

use crate::supabase::SupabaseClient;

pub const ALLOWED_CONTENT_TYPES: [&str; 3] = ["image/jpeg", "image/png", "image/gif"];

/// Upload problems the caller can fix are kept apart from failures of the
/// storage service itself.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("{0}")]
    InvalidImage(String),

    #[error("Photo storage failed: {0}")]
    Backend(#[from] anyhow::Error),
}

/// Which family of entity a photo belongs to. Each family has its own folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhotoKind {
    User,
    Doctor,
}

impl PhotoKind {
    pub fn folder(&self) -> &'static str {
        match self {
            PhotoKind::User => "user_photos",
            PhotoKind::Doctor => "doctor_photos",
        }
    }
}

pub fn is_allowed_content_type(content_type: &str) -> bool {
    ALLOWED_CONTENT_TYPES.contains(&content_type)
}

/// Decodes plain base64 or a `data:<type>;base64,<payload>` URL.
pub fn decode_image_data(data: &str) -> Result<Vec<u8>> {
    let payload = match data.split_once(',') {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => data,
    };
    Ok(BASE64.decode(payload.trim())?)
}

pub struct PhotoStorage {
    supabase: SupabaseClient,
    bucket: String,
}

impl PhotoStorage {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            bucket: config.photo_storage_bucket.clone(),
        }
    }

    /// Object key for an entity's photo; stored without an extension.
    pub fn object_key(kind: PhotoKind, id: &str) -> String {
        format!("{}/{}", kind.folder(), id)
    }

    pub fn public_url(&self, kind: PhotoKind, id: &str) -> String {
        self.supabase.get_public_url(&format!(
            "/storage/v1/object/public/{}/{}",
            self.bucket,
            Self::object_key(kind, id)
        ))
    }

    /// Uploads or replaces the photo and returns its public URL.
    pub async fn set_photo(
        &self,
        kind: PhotoKind,
        id: &str,
        image_data: &str,
        content_type: &str,
        auth_token: &str,
    ) -> Result<String, StorageError> {
        debug!("Uploading {} photo for {}", kind.folder(), id);

        if !is_allowed_content_type(content_type) {
            return Err(StorageError::InvalidImage(
                "Invalid file type. Only JPEG, PNG, and GIF images are allowed.".to_string(),
            ));
        }

        let bytes = decode_image_data(image_data)
            .map_err(|e| StorageError::InvalidImage(format!("Image data is not valid base64: {}", e)))?;
        if bytes.is_empty() {
            return Err(StorageError::InvalidImage("Image data is empty".to_string()));
        }

        let path = format!("/storage/v1/object/{}/{}", self.bucket, Self::object_key(kind, id));
        self.supabase.upload_bytes(&path, Some(auth_token), bytes, content_type).await?;

        info!("Stored {} photo for {}", kind.folder(), id);
        Ok(self.public_url(kind, id))
    }

    pub async fn delete_photo(&self, kind: PhotoKind, id: &str, auth_token: &str) -> Result<(), StorageError> {
        debug!("Deleting {} photo for {}", kind.folder(), id);

        let path = format!("/storage/v1/object/{}/{}", self.bucket, Self::object_key(kind, id));
        self.supabase.request_no_content(Method::DELETE, &path, Some(auth_token), None).await?;
        Ok(())
    }
}
