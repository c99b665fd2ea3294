use std::env;
use tracing::warn;

pub const DEFAULT_PHOTO_BUCKET: &str = "photos";
pub const DEFAULT_UPCOMING_BUFFER_MINUTES: u32 = 30;
pub const MAX_UPCOMING_BUFFER_MINUTES: u32 = 24 * 60;
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:3000";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_service_role_key: String,
    pub supabase_jwt_secret: String,
    pub photo_storage_bucket: String,
    /// Minutes added to "now" before splitting appointments into upcoming and past.
    pub upcoming_buffer_minutes: u32,
    pub bind_address: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, using empty value");
                    String::new()
                }),
            supabase_anon_key: env::var("SUPABASE_ANON_PUBLIC_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_ANON_PUBLIC_KEY not set, using empty value");
                    String::new()
                }),
            supabase_service_role_key: env::var("SUPABASE_SERVICE_ROLE_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_SERVICE_ROLE_KEY not set, account management disabled");
                    String::new()
                }),
            supabase_jwt_secret: env::var("SUPABASE_JWT_SECRET")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_JWT_SECRET not set, using empty value");
                    String::new()
                }),
            photo_storage_bucket: env::var("PHOTO_STORAGE_BUCKET")
                .unwrap_or_else(|_| DEFAULT_PHOTO_BUCKET.to_string()),
            upcoming_buffer_minutes: env::var("UPCOMING_BUFFER_MINUTES")
                .map(|raw| parse_upcoming_buffer(&raw))
                .unwrap_or(DEFAULT_UPCOMING_BUFFER_MINUTES),
            bind_address: env::var("BIND_ADDRESS")
                .unwrap_or_else(|_| DEFAULT_BIND_ADDRESS.to_string()),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.supabase_url.is_empty()
            && !self.supabase_anon_key.is_empty()
            && !self.supabase_jwt_secret.is_empty()
    }

    pub fn is_account_admin_configured(&self) -> bool {
        self.is_configured() && !self.supabase_service_role_key.is_empty()
    }

    /// The upcoming buffer in minutes, never above one day.
    pub fn effective_upcoming_buffer_minutes(&self) -> i64 {
        i64::from(self.upcoming_buffer_minutes.min(MAX_UPCOMING_BUFFER_MINUTES))
    }
}

/// Reads `UPCOMING_BUFFER_MINUTES`: a whole number of minutes from 0 to one day.
pub fn parse_upcoming_buffer(raw: &str) -> u32 {
    match raw.trim().parse::<u32>() {
        Ok(minutes) if minutes <= MAX_UPCOMING_BUFFER_MINUTES => minutes,
        Ok(minutes) => {
            warn!(
                "UPCOMING_BUFFER_MINUTES ({}) exceeds {}, clamping",
                minutes, MAX_UPCOMING_BUFFER_MINUTES
            );
            MAX_UPCOMING_BUFFER_MINUTES
        }
        Err(_) => {
            warn!("UPCOMING_BUFFER_MINUTES is not a non-negative number ({}), using default", raw);
            DEFAULT_UPCOMING_BUFFER_MINUTES
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            supabase_url: String::new(),
            supabase_anon_key: String::new(),
            supabase_service_role_key: String::new(),
            supabase_jwt_secret: String::new(),
            photo_storage_bucket: DEFAULT_PHOTO_BUCKET.to_string(),
            upcoming_buffer_minutes: DEFAULT_UPCOMING_BUFFER_MINUTES,
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_not_configured() {
        let config = AppConfig::default();
        assert!(!config.is_configured());
        assert!(!config.is_account_admin_configured());
        assert_eq!(config.upcoming_buffer_minutes, 30);
        assert_eq!(config.photo_storage_bucket, "photos");
    }

    #[test]
    fn upcoming_buffer_rejects_negative_and_clamps_large_values() {
        assert_eq!(parse_upcoming_buffer("45"), 45);
        assert_eq!(parse_upcoming_buffer(" 0 "), 0);
        assert_eq!(parse_upcoming_buffer("-5"), DEFAULT_UPCOMING_BUFFER_MINUTES);
        assert_eq!(parse_upcoming_buffer("soon"), DEFAULT_UPCOMING_BUFFER_MINUTES);
        assert_eq!(parse_upcoming_buffer("1441"), MAX_UPCOMING_BUFFER_MINUTES);
        assert_eq!(parse_upcoming_buffer("200000000000000"), DEFAULT_UPCOMING_BUFFER_MINUTES);
    }

    #[test]
    fn effective_buffer_is_bounded_even_when_set_directly() {
        let config = AppConfig {
            upcoming_buffer_minutes: u32::MAX,
            ..AppConfig::default()
        };
        assert_eq!(config.effective_upcoming_buffer_minutes(), 1440);
        assert_eq!(AppConfig::default().effective_upcoming_buffer_minutes(), 30);
    }

    #[test]
    fn account_admin_requires_service_role_key() {
        let mut config = AppConfig {
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "anon".to_string(),
            supabase_jwt_secret: "secret".to_string(),
            ..AppConfig::default()
        };
        assert!(config.is_configured());
        assert!(!config.is_account_admin_configured());

        config.supabase_service_role_key = "service".to_string();
        assert!(config.is_account_admin_configured());
    }
}
