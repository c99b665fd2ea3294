use serde::{Deserialize, Serialize};

/// Photo upload body: base64 bytes (or a `data:` URL) plus the declared MIME type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhotoUpload {
    pub image_data: String,
    pub content_type: String,
}
