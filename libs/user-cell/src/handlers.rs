use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use serde_json::{json, Value};
use tracing::debug;

use auth_cell::SessionService;
use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;
use shared_models::media::PhotoUpload;

use crate::models::{CreateAccountRequest, UpdateAccountRequest, UserListQuery, UserRecordRequest};
use crate::services::{AccountService, UserService};

#[axum::debug_handler]
pub async fn list_users(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Query(query): Query<UserListQuery>,
) -> Result<Json<Value>, AppError> {
    let user_service = UserService::new(&state);

    let users = user_service.list_users(&query, auth.token()).await?;

    Ok(Json(json!({
        "users": users,
        "total": users.len()
    })))
}

#[axum::debug_handler]
pub async fn get_user(
    State(state): State<Arc<AppConfig>>,
    Path(user_id): Path<String>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let user_service = UserService::new(&state);

    let user = user_service.get_user(&user_id, auth.token()).await?;

    Ok(Json(json!(user)))
}

#[axum::debug_handler]
pub async fn set_user(
    State(state): State<Arc<AppConfig>>,
    Path(user_id): Path<String>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<UserRecordRequest>,
) -> Result<Json<Value>, AppError> {
    let user_service = UserService::new(&state);

    let user = user_service.set_user(&user_id, request, auth.token()).await?;

    Ok(Json(json!(user)))
}

#[axum::debug_handler]
pub async fn delete_user(
    State(state): State<Arc<AppConfig>>,
    Path(user_id): Path<String>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let user_service = UserService::new(&state);

    user_service.delete_user(&user_id, auth.token()).await?;

    Ok(Json(json!({
        "success": true,
        "message": "User deleted"
    })))
}

#[axum::debug_handler]
pub async fn set_user_photo(
    State(state): State<Arc<AppConfig>>,
    Path(user_id): Path<String>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(upload): Json<PhotoUpload>,
) -> Result<Json<Value>, AppError> {
    let user_service = UserService::new(&state);

    let url = user_service.set_user_photo(&user_id, upload, auth.token()).await?;

    Ok(Json(json!({
        "profile_picture_uri": url
    })))
}

#[axum::debug_handler]
pub async fn delete_user_photo(
    State(state): State<Arc<AppConfig>>,
    Path(user_id): Path<String>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let user_service = UserService::new(&state);

    user_service.delete_user_photo(&user_id, auth.token()).await?;

    Ok(Json(json!({
        "success": true,
        "message": "User photo removed"
    })))
}

// ==============================================================================
// ACCOUNT HANDLERS (system admins only)
// ==============================================================================

#[axum::debug_handler]
pub async fn create_account(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateAccountRequest>,
) -> Result<Json<Value>, AppError> {
    debug!("Account creation requested by {}", user.id);
    SessionService::new(&state).require_system_admin(&user, auth.token()).await?;

    let created = AccountService::new(&state).create_account(request).await?;

    Ok(Json(json!(created)))
}

#[axum::debug_handler]
pub async fn update_account(
    State(state): State<Arc<AppConfig>>,
    Path(uid): Path<String>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<UpdateAccountRequest>,
) -> Result<Json<Value>, AppError> {
    debug!("Account update for {} requested by {}", uid, user.id);
    SessionService::new(&state).require_system_admin(&user, auth.token()).await?;

    AccountService::new(&state).update_account(&uid, request).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Account updated"
    })))
}

#[axum::debug_handler]
pub async fn delete_account(
    State(state): State<Arc<AppConfig>>,
    Path(uid): Path<String>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    debug!("Account deletion for {} requested by {}", uid, user.id);
    SessionService::new(&state).require_system_admin(&user, auth.token()).await?;

    AccountService::new(&state).delete_account(&uid).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Account deleted"
    })))
}
