use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::error::AppError;
use shared_models::media::PhotoUpload;

use crate::models::{DoctorListQuery, DoctorRequest};
use crate::services::DoctorService;

#[axum::debug_handler]
pub async fn list_doctors(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Query(query): Query<DoctorListQuery>,
) -> Result<Json<Value>, AppError> {
    let doctor_service = DoctorService::new(&state);

    let doctors = doctor_service.list_doctors(&query, auth.token()).await?;

    Ok(Json(json!({
        "doctors": doctors,
        "total": doctors.len()
    })))
}

#[axum::debug_handler]
pub async fn get_doctor(
    State(state): State<Arc<AppConfig>>,
    Path(doctor_id): Path<String>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let doctor_service = DoctorService::new(&state);

    let doctor = doctor_service.get_doctor(&doctor_id, auth.token()).await?;

    Ok(Json(json!(doctor)))
}

#[axum::debug_handler]
pub async fn create_doctor(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<DoctorRequest>,
) -> Result<Json<Value>, AppError> {
    let doctor_service = DoctorService::new(&state);

    let doctor = doctor_service.create_doctor(request, auth.token()).await?;

    Ok(Json(json!(doctor)))
}

#[axum::debug_handler]
pub async fn update_doctor(
    State(state): State<Arc<AppConfig>>,
    Path(doctor_id): Path<String>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<DoctorRequest>,
) -> Result<Json<Value>, AppError> {
    let doctor_service = DoctorService::new(&state);

    let doctor = doctor_service.update_doctor(&doctor_id, request, auth.token()).await?;

    Ok(Json(json!(doctor)))
}

#[axum::debug_handler]
pub async fn delete_doctor(
    State(state): State<Arc<AppConfig>>,
    Path(doctor_id): Path<String>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let doctor_service = DoctorService::new(&state);

    doctor_service.delete_doctor(&doctor_id, auth.token()).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Doctor deleted"
    })))
}

#[axum::debug_handler]
pub async fn set_doctor_photo(
    State(state): State<Arc<AppConfig>>,
    Path(doctor_id): Path<String>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(upload): Json<PhotoUpload>,
) -> Result<Json<Value>, AppError> {
    let doctor_service = DoctorService::new(&state);

    let url = doctor_service.set_doctor_photo(&doctor_id, upload, auth.token()).await?;

    Ok(Json(json!({
        "profile_picture_uri": url
    })))
}

#[axum::debug_handler]
pub async fn delete_doctor_photo(
    State(state): State<Arc<AppConfig>>,
    Path(doctor_id): Path<String>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let doctor_service = DoctorService::new(&state);

    doctor_service.delete_doctor_photo(&doctor_id, auth.token()).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Doctor photo removed"
    })))
}
