use anyhow::{Result, anyhow};
use reqwest::{
    Client, RequestBuilder, Response,
    header::{HeaderMap, HeaderValue, CONTENT_TYPE, AUTHORIZATION},
    Method,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error};

use shared_config::AppConfig;

pub struct SupabaseClient {
    client: Client,
    base_url: String,
    anon_key: String,
    service_role_key: String,
}

impl SupabaseClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.supabase_url.trim_end_matches('/').to_string(),
            anon_key: config.supabase_anon_key.clone(),
            service_role_key: config.supabase_service_role_key.clone(),
        }
    }

    fn get_headers(&self, api_key: &str, auth_token: Option<&str>) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();

        headers.insert("apikey", HeaderValue::from_str(api_key)?);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(token) = auth_token {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", token))?,
            );
        }

        Ok(headers)
    }

    fn build(&self, method: Method, path: &str, headers: HeaderMap) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making {} request to {}", method, url);
        self.client.request(method, &url).headers(headers)
    }

    async fn check_status(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let error_text = response.text().await?;
        error!("API error ({}): {}", status, error_text);

        Err(match status.as_u16() {
            401 | 403 => anyhow!("Authentication error: {}", error_text),
            404 => anyhow!("Resource not found: {}", error_text),
            409 => anyhow!("Conflict: {}", error_text),
            _ => anyhow!("API error ({}): {}", status, error_text),
        })
    }

    pub async fn request<T>(&self, method: Method, path: &str,
                            auth_token: Option<&str>, body: Option<Value>)
                            -> Result<T>
    where T: DeserializeOwned {
        self.request_with_headers(method, path, auth_token, body, None).await
    }

    pub async fn request_with_headers<T>(
        &self,
        method: Method,
        path: &str,
        auth_token: Option<&str>,
        body: Option<Value>,
        extra_headers: Option<HeaderMap>,
    ) -> Result<T>
    where T: DeserializeOwned {
        let mut headers = self.get_headers(&self.anon_key, auth_token)?;
        if let Some(extra) = extra_headers {
            headers.extend(extra);
        }

        let mut req = self.build(method, path, headers);
        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = Self::check_status(req.send().await?).await?;
        let data = response.json::<T>().await?;
        Ok(data)
    }

    /// Sends a request whose success response carries no body (PostgREST deletes, storage removals).
    pub async fn request_no_content(
        &self,
        method: Method,
        path: &str,
        auth_token: Option<&str>,
        body: Option<Value>,
    ) -> Result<()> {
        let headers = self.get_headers(&self.anon_key, auth_token)?;

        let mut req = self.build(method, path, headers);
        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        Self::check_status(req.send().await?).await?;
        Ok(())
    }

    /// Uploads raw bytes, replacing any existing object at the same path.
    pub async fn upload_bytes(
        &self,
        path: &str,
        auth_token: Option<&str>,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<()> {
        let mut headers = self.get_headers(&self.anon_key, auth_token)?;
        headers.insert(CONTENT_TYPE, HeaderValue::from_str(content_type)?);
        headers.insert("x-upsert", HeaderValue::from_static("true"));

        let req = self.build(Method::POST, path, headers).body(bytes);
        Self::check_status(req.send().await?).await?;
        Ok(())
    }

    /// Calls the auth admin API with the service role key. Never use a caller's token here.
    pub async fn admin_request<T>(&self, method: Method, path: &str, body: Option<Value>) -> Result<T>
    where T: DeserializeOwned {
        if self.service_role_key.is_empty() {
            return Err(anyhow!("Service role key is not configured"));
        }

        let headers = self.get_headers(&self.service_role_key, Some(&self.service_role_key))?;

        let mut req = self.build(method, path, headers);
        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = Self::check_status(req.send().await?).await?;
        let data = response.json::<T>().await?;
        Ok(data)
    }

    pub fn get_public_url(&self, storage_path: &str) -> String {
        format!("{}{}", self.base_url, storage_path)
    }
}

/// Header asking PostgREST to echo written rows back.
pub fn return_representation() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("Prefer", HeaderValue::from_static("return=representation"));
    headers
}

/// Insert-or-replace on the primary key, echoing the stored row.
pub fn upsert_representation() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        "Prefer",
        HeaderValue::from_static("resolution=merge-duplicates,return=representation"),
    );
    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_trimmed_from_base_url() {
        let config = AppConfig {
            supabase_url: "http://localhost:54321/".to_string(),
            ..AppConfig::default()
        };
        let client = SupabaseClient::new(&config);
        assert_eq!(
            client.get_public_url("/storage/v1/object/public/photos/a"),
            "http://localhost:54321/storage/v1/object/public/photos/a"
        );
    }

    #[tokio::test]
    async fn admin_request_requires_service_role_key() {
        let client = SupabaseClient::new(&AppConfig::default());
        let result: Result<Value> = client.admin_request(Method::DELETE, "/auth/v1/admin/users/x", None).await;
        assert!(result.is_err());
    }
}
