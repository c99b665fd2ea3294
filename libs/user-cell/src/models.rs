use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared_database::storage::StorageError;
use shared_models::auth::RoleFlags;
use shared_models::error::AppError;

/// Minimum password length accepted by the identity provider.
pub const MIN_PASSWORD_LEN: usize = 6;

static EMAIL_PATTERN: OnceLock<Option<Regex>> = OnceLock::new();

pub fn is_valid_email(email: &str) -> bool {
    email.len() <= 254
        && EMAIL_PATTERN
            .get_or_init(|| Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").ok())
            .as_ref()
            .is_some_and(|pattern| pattern.is_match(email))
}

// ==============================================================================
// USER RECORDS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub gender_code: String,
    #[serde(default)]
    pub profile_picture_uri: String,
    #[serde(flatten)]
    pub roles: RoleFlags,
}

impl UserRecord {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Whole-record write of a user's directory entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecordRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub gender_code: String,
    #[serde(default)]
    pub profile_picture_uri: String,
    #[serde(flatten)]
    pub roles: RoleFlags,
}

impl UserRecordRequest {
    pub fn validate(&self) -> Result<(), UserError> {
        if self.first_name.trim().is_empty() || self.last_name.trim().is_empty() {
            return Err(UserError::ValidationError("First and last name are required".to_string()));
        }
        if !is_valid_email(&self.email) {
            return Err(UserError::ValidationError(format!("{} is not a valid email address", self.email)));
        }
        Ok(())
    }

    pub fn into_record(self, id: String) -> UserRecord {
        UserRecord {
            id,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            phone_number: self.phone_number,
            gender_code: self.gender_code,
            profile_picture_uri: self.profile_picture_uri,
            roles: self.roles,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserListQuery {
    /// Comma-separated ids to leave out.
    pub exclude: Option<String>,
}

impl UserListQuery {
    pub fn excluded_ids(&self) -> Vec<&str> {
        self.exclude
            .as_deref()
            .map(|ids| ids.split(',').map(str::trim).filter(|id| !id.is_empty()).collect())
            .unwrap_or_default()
    }
}

// ==============================================================================
// AUTH ACCOUNTS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAccountRequest {
    pub email: String,
    pub password: String,
}

impl CreateAccountRequest {
    pub fn validate(&self) -> Result<(), AccountError> {
        validate_email(&self.email)?;
        validate_password(&self.password)
    }
}

/// Empty strings are treated as "leave unchanged".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateAccountRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

impl UpdateAccountRequest {
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref().filter(|email| !email.is_empty())
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_deref().filter(|password| !password.is_empty())
    }

    pub fn validate(&self) -> Result<(), AccountError> {
        if self.email().is_none() && self.password().is_none() {
            return Err(AccountError::NothingToUpdate);
        }
        if let Some(email) = self.email() {
            validate_email(email)?;
        }
        if let Some(password) = self.password() {
            validate_password(password)?;
        }
        Ok(())
    }
}

fn validate_email(email: &str) -> Result<(), AccountError> {
    if is_valid_email(email) {
        Ok(())
    } else {
        Err(AccountError::InvalidEmail(email.to_string()))
    }
}

fn validate_password(password: &str) -> Result<(), AccountError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AccountError::WeakPassword(MIN_PASSWORD_LEN));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountCreated {
    pub uid: String,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Debug, Error)]
pub enum UserError {
    #[error("User not found")]
    NotFound,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid photo: {0}")]
    InvalidPhoto(String),

    #[error("Photo storage error: {0}")]
    Storage(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<anyhow::Error> for UserError {
    fn from(e: anyhow::Error) -> Self {
        UserError::DatabaseError(e.to_string())
    }
}

impl From<StorageError> for UserError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::InvalidImage(msg) => UserError::InvalidPhoto(msg),
            StorageError::Backend(e) => UserError::Storage(e.to_string()),
        }
    }
}

impl From<UserError> for AppError {
    fn from(e: UserError) -> Self {
        match e {
            UserError::NotFound => AppError::NotFound(e.to_string()),
            UserError::ValidationError(msg) => AppError::ValidationError(msg),
            UserError::InvalidPhoto(msg) => AppError::BadRequest(msg),
            UserError::Storage(msg) => AppError::ExternalService(msg),
            UserError::DatabaseError(msg) => AppError::Database(msg),
        }
    }
}

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("{0} is not a valid email address")]
    InvalidEmail(String),

    #[error("Password must be at least {0} characters")]
    WeakPassword(usize),

    #[error("Provide an email or a password to update")]
    NothingToUpdate,

    #[error("Identity provider error: {0}")]
    Provider(String),
}

impl From<anyhow::Error> for AccountError {
    fn from(e: anyhow::Error) -> Self {
        AccountError::Provider(e.to_string())
    }
}

impl From<AccountError> for AppError {
    fn from(e: AccountError) -> Self {
        match e {
            AccountError::Provider(_) => AppError::ExternalService(e.to_string()),
            _ => AppError::ValidationError(e.to_string()),
        }
    }
}
