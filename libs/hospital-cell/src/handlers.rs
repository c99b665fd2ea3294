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

use crate::models::{AssignHospitalRequest, DepartmentRequest, ExcludeQuery, HospitalError, HospitalRequest};
use crate::services::{AssignmentService, DepartmentService, HospitalService};

// ==============================================================================
// HOSPITAL HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_hospitals(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Query(query): Query<ExcludeQuery>,
) -> Result<Json<Value>, AppError> {
    let hospital_service = HospitalService::new(&state);

    let hospitals = hospital_service.list_hospitals(&query, auth.token()).await?;

    Ok(Json(json!({
        "hospitals": hospitals,
        "total": hospitals.len()
    })))
}

#[axum::debug_handler]
pub async fn get_hospital(
    State(state): State<Arc<AppConfig>>,
    Path(hospital_id): Path<String>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let hospital = HospitalService::new(&state).get_hospital(&hospital_id, auth.token()).await?;

    Ok(Json(json!(hospital)))
}

#[axum::debug_handler]
pub async fn add_hospital(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<HospitalRequest>,
) -> Result<Json<Value>, AppError> {
    let hospital = HospitalService::new(&state).add_hospital(request, auth.token()).await?;

    Ok(Json(json!(hospital)))
}

#[axum::debug_handler]
pub async fn set_hospital(
    State(state): State<Arc<AppConfig>>,
    Path(hospital_id): Path<String>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<HospitalRequest>,
) -> Result<Json<Value>, AppError> {
    let hospital = HospitalService::new(&state)
        .set_hospital(&hospital_id, request, auth.token())
        .await?;

    Ok(Json(json!(hospital)))
}

#[axum::debug_handler]
pub async fn delete_hospital(
    State(state): State<Arc<AppConfig>>,
    Path(hospital_id): Path<String>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    HospitalService::new(&state).delete_hospital(&hospital_id, auth.token()).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Hospital deleted"
    })))
}

// ==============================================================================
// ASSIGNMENT HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_assignments(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let assignments = AssignmentService::new(&state).list_assignments(auth.token()).await?;

    Ok(Json(json!({
        "assignments": assignments,
        "total": assignments.len()
    })))
}

#[axum::debug_handler]
pub async fn get_assignment(
    State(state): State<Arc<AppConfig>>,
    Path(user_id): Path<String>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let hospital_id = AssignmentService::new(&state)
        .assigned_hospital_id(&user_id, auth.token())
        .await?
        .ok_or(HospitalError::AssignmentNotFound)?;

    Ok(Json(json!({
        "user_id": user_id,
        "hospital_id": hospital_id
    })))
}

#[axum::debug_handler]
pub async fn set_assignment(
    State(state): State<Arc<AppConfig>>,
    Path(user_id): Path<String>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<AssignHospitalRequest>,
) -> Result<Json<Value>, AppError> {
    let assignment = AssignmentService::new(&state)
        .set_assignment(&user_id, &request.hospital_id, auth.token())
        .await?;

    Ok(Json(json!(assignment)))
}

#[axum::debug_handler]
pub async fn delete_assignment(
    State(state): State<Arc<AppConfig>>,
    Path(user_id): Path<String>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    AssignmentService::new(&state).delete_assignment(&user_id, auth.token()).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Hospital assignment removed"
    })))
}

// ==============================================================================
// DEPARTMENT HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_departments(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Query(query): Query<ExcludeQuery>,
) -> Result<Json<Value>, AppError> {
    let departments = DepartmentService::new(&state).list_departments(&query, auth.token()).await?;

    Ok(Json(json!({
        "departments": departments,
        "total": departments.len()
    })))
}

#[axum::debug_handler]
pub async fn get_department(
    State(state): State<Arc<AppConfig>>,
    Path(department_id): Path<String>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let department = DepartmentService::new(&state).get_department(&department_id, auth.token()).await?;

    Ok(Json(json!(department)))
}

#[axum::debug_handler]
pub async fn add_department(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<DepartmentRequest>,
) -> Result<Json<Value>, AppError> {
    let department = DepartmentService::new(&state).add_department(request, auth.token()).await?;

    Ok(Json(json!(department)))
}

#[axum::debug_handler]
pub async fn set_department(
    State(state): State<Arc<AppConfig>>,
    Path(department_id): Path<String>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<DepartmentRequest>,
) -> Result<Json<Value>, AppError> {
    let department = DepartmentService::new(&state)
        .set_department(&department_id, request, auth.token())
        .await?;

    Ok(Json(json!(department)))
}

#[axum::debug_handler]
pub async fn delete_department(
    State(state): State<Arc<AppConfig>>,
    Path(department_id): Path<String>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    DepartmentService::new(&state).delete_department(&department_id, auth.token()).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Department deleted"
    })))
}
