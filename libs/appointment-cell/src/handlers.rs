use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use chrono::{Local, NaiveDateTime};
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::models::{
    AvailabilityQuery, BookAppointmentRequest, PastAppointmentFilters,
    UpdateAppointmentRequest, UpdateNotesRequest,
};
use crate::services::{AppointmentBookingService, AppointmentTimelineService};

/// Appointment dates and times are wall-clock values in the server's zone.
fn wall_clock_now() -> NaiveDateTime {
    Local::now().naive_local()
}

// ==============================================================================
// AVAILABILITY
// ==============================================================================

#[axum::debug_handler]
pub async fn get_available_times(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<Value>, AppError> {
    let booking_service = AppointmentBookingService::new(&state);

    let available_times = booking_service.available_times(&query, auth.token()).await?;

    Ok(Json(json!({
        "doctor_id": query.doctor_id,
        "date": query.date,
        "available_times": available_times
    })))
}

// ==============================================================================
// BOOKING AND EDITING
// ==============================================================================

#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let booking_service = AppointmentBookingService::new(&state);

    let appointment = booking_service
        .book_appointment(request, wall_clock_now(), auth.token())
        .await?;

    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<String>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let booking_service = AppointmentBookingService::new(&state);

    let appointment = booking_service.get_appointment(&appointment_id, auth.token()).await?;

    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn update_appointment(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<String>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<UpdateAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let booking_service = AppointmentBookingService::new(&state);

    let appointment = booking_service
        .update_appointment(&appointment_id, request, wall_clock_now(), auth.token())
        .await?;

    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn update_appointment_notes(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<String>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<UpdateNotesRequest>,
) -> Result<Json<Value>, AppError> {
    let booking_service = AppointmentBookingService::new(&state);

    let appointment = booking_service
        .update_notes(&appointment_id, &request.appointment_notes, auth.token())
        .await?;

    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn delete_appointment(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<String>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let booking_service = AppointmentBookingService::new(&state);

    booking_service.delete_appointment(&appointment_id, auth.token()).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Appointment deleted"
    })))
}

// ==============================================================================
// LISTINGS
// ==============================================================================

#[axum::debug_handler]
pub async fn get_upcoming_appointments(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let timeline_service = AppointmentTimelineService::new(&state);
    let now = wall_clock_now();

    let appointments = timeline_service.upcoming(now, auth.token()).await?;

    Ok(Json(json!({
        "appointments": appointments,
        "total": appointments.len(),
        "cutoff": timeline_service.cutoff(now)
    })))
}

#[axum::debug_handler]
pub async fn get_past_appointments(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Query(filters): Query<PastAppointmentFilters>,
) -> Result<Json<Value>, AppError> {
    let timeline_service = AppointmentTimelineService::new(&state);
    let now = wall_clock_now();

    let appointments = timeline_service.past(&filters, now, auth.token()).await?;

    Ok(Json(json!({
        "appointments": appointments,
        "total": appointments.len(),
        "cutoff": timeline_service.cutoff(now)
    })))
}
