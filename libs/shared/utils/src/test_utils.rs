use std::sync::Arc;
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use base64::{Engine as _, engine::general_purpose};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::{RoleFlags, User};

pub const TEST_JWT_SECRET: &str = "test-secret-key-for-jwt-validation-must-be-long-enough";

pub struct TestConfig {
    pub jwt_secret: String,
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_service_role_key: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: TEST_JWT_SECRET.to_string(),
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
            supabase_service_role_key: "test-service-role-key".to_string(),
        }
    }
}

impl TestConfig {
    /// Config pointing at a mock server, e.g. `wiremock::MockServer::uri()`.
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            supabase_url: url.into(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_anon_key: self.supabase_anon_key.clone(),
            supabase_service_role_key: self.supabase_service_role_key.clone(),
            supabase_jwt_secret: self.jwt_secret.clone(),
            ..AppConfig::default()
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct TestUser {
    pub id: String,
    pub email: String,
    pub roles: RoleFlags,
}

impl Default for TestUser {
    fn default() -> Self {
        Self::new("test@example.com", RoleFlags { is_patient: true, ..RoleFlags::default() })
    }
}

impl TestUser {
    pub fn new(email: &str, roles: RoleFlags) -> Self {
        Self {
            id: Uuid::new_v4().simple().to_string(),
            email: email.to_string(),
            roles,
        }
    }

    pub fn patient(email: &str) -> Self {
        Self::new(email, RoleFlags { is_patient: true, ..RoleFlags::default() })
    }

    pub fn hospital_admin(email: &str) -> Self {
        Self::new(email, RoleFlags { is_hospital_admin: true, ..RoleFlags::default() })
    }

    pub fn system_admin(email: &str) -> Self {
        Self::new(email, RoleFlags { is_system_admin: true, ..RoleFlags::default() })
    }

    pub fn to_user(&self) -> User {
        User {
            id: self.id.clone(),
            email: Some(self.email.clone()),
            role: Some("authenticated".to_string()),
            metadata: None,
            created_at: Some(Utc::now()),
        }
    }

    pub fn token(&self) -> String {
        JwtTestUtils::create_test_token(self, TEST_JWT_SECRET, None)
    }

    /// The `users` table row backing this principal.
    pub fn record(&self) -> Value {
        MockSupabaseResponses::user_record(&self.id, &self.email, self.roles)
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_test_token(user: &TestUser, secret: &str, exp_hours: Option<i64>) -> String {
        let now = Utc::now();
        let exp = now + Duration::hours(exp_hours.unwrap_or(24));

        let header = json!({
            "alg": "HS256",
            "typ": "JWT"
        });

        let payload = json!({
            "sub": user.id,
            "email": user.email,
            "role": "authenticated",
            "iat": now.timestamp(),
            "exp": exp.timestamp()
        });

        let header_encoded = general_purpose::URL_SAFE_NO_PAD.encode(header.to_string());
        let payload_encoded = general_purpose::URL_SAFE_NO_PAD.encode(payload.to_string());

        let signing_input = format!("{}.{}", header_encoded, payload_encoded);

        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(signing_input.as_bytes());
        let signature = mac.finalize().into_bytes();
        let signature_encoded = general_purpose::URL_SAFE_NO_PAD.encode(signature);

        format!("{}.{}", signing_input, signature_encoded)
    }

    pub fn create_expired_token(user: &TestUser, secret: &str) -> String {
        Self::create_test_token(user, secret, Some(-1))
    }

    pub fn create_invalid_signature_token(user: &TestUser) -> String {
        Self::create_test_token(user, "wrong-secret", Some(24))
    }

    pub fn create_malformed_token() -> String {
        "invalid.token.format".to_string()
    }
}

pub struct MockSupabaseResponses;

impl MockSupabaseResponses {
    pub fn user_record(user_id: &str, email: &str, roles: RoleFlags) -> Value {
        json!({
            "id": user_id,
            "first_name": "Test",
            "last_name": "User",
            "email": email,
            "phone_number": "555-0100",
            "gender_code": "U",
            "profile_picture_uri": "",
            "is_patient": roles.is_patient,
            "is_hospital_admin": roles.is_hospital_admin,
            "is_system_admin": roles.is_system_admin
        })
    }

    pub fn closed_day() -> Value {
        json!({ "available": false })
    }

    pub fn open_day(start_time: &str, end_time: &str) -> Value {
        json!({ "available": true, "start_time": start_time, "end_time": end_time })
    }

    /// Doctor open 09:00-17:00 on weekdays and closed at weekends.
    pub fn doctor_record(doctor_id: &str, name: &str, hospital_id: &str) -> Value {
        let weekday = Self::open_day("09:00", "17:00");
        json!({
            "id": doctor_id,
            "name": name,
            "degrees": "MD",
            "phone_number": "555-0101",
            "profile_picture_uri": "",
            "department_id": "dept-1",
            "hospital_id": hospital_id,
            "office_hours": {
                "monday": weekday,
                "tuesday": weekday,
                "wednesday": weekday,
                "thursday": weekday,
                "friday": weekday,
                "saturday": Self::closed_day(),
                "sunday": Self::closed_day()
            }
        })
    }

    pub fn appointment_record(
        appointment_id: &str,
        user_id: &str,
        doctor_id: &str,
        date: &str,
        start_time: &str,
    ) -> Value {
        json!({
            "id": appointment_id,
            "user_id": user_id,
            "appointment_start_time": start_time,
            "date": date,
            "reason_for_visit": "Checkup",
            "doctor_id": doctor_id,
            "department_id": "dept-1",
            "hospital_id": "hosp-1",
            "appointment_notes": ""
        })
    }

    pub fn hospital_record(hospital_id: &str, name: &str) -> Value {
        json!({
            "id": hospital_id,
            "name": name,
            "street_address": "1 Main Street",
            "neighborhood": "Centre",
            "city": "Springfield",
            "postal_code": "12345",
            "country": "US",
            "appointment_link": "https://example.com/book"
        })
    }

    pub fn error_response(message: &str, code: &str) -> Value {
        json!({
            "error": {
                "message": message,
                "code": code
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_creation() {
        let config = TestConfig::default();
        let app_config = config.to_app_config();

        assert_eq!(app_config.supabase_url, "http://localhost:54321");
        assert_eq!(app_config.supabase_anon_key, "test-anon-key");
        assert!(app_config.is_account_admin_configured());
    }

    #[test]
    fn test_user_roles_carry_into_record() {
        let admin = TestUser::system_admin("admin@example.com");
        let record = admin.record();
        assert_eq!(record["is_system_admin"], true);
        assert_eq!(record["is_patient"], false);
        assert_eq!(record["email"], "admin@example.com");
        assert_eq!(admin.to_user().id, admin.id);
    }

    #[test]
    fn test_jwt_token_creation() {
        let user = TestUser::default();
        let token = JwtTestUtils::create_test_token(&user, "test-secret", Some(1));
        assert_eq!(token.split('.').count(), 3);
    }
}
