use super::{today, ApiError, ApiJson};
use crate::auth::{AdminUser, AuthUser};
use crate::booking::BookingService;
use crate::models::ReservationRequest;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub date: Option<String>,
}

/// Schedule for one day (today in UTC unless `?date=` is given), earliest first.
pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<Value>, ApiError> {
    let date = query.date.unwrap_or_else(today);
    let bookings = BookingService::new(state.db_pool.clone()).list_for_date(&date).await?;
    Ok(Json(json!({ "date": date, "bookings": bookings })))
}

pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    ApiJson(request): ApiJson<ReservationRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    tracing::info!("Booking request from {}", user.email);
    let booking = BookingService::new(state.db_pool.clone())
        .create_reservation(request)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Booking created successfully", "booking": booking })),
    ))
}

pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let booking = BookingService::new(state.db_pool.clone()).get_reservation(id).await?;
    Ok(Json(json!({ "booking": booking })))
}

pub async fn update_booking(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Path(id): Path<i64>,
    ApiJson(request): ApiJson<ReservationRequest>,
) -> Result<Json<Value>, ApiError> {
    tracing::info!("Admin {} editing reservation {}", admin.email, id);
    let booking = BookingService::new(state.db_pool.clone())
        .update_reservation(id, request)
        .await?;
    Ok(Json(json!({ "message": "Booking updated successfully", "booking": booking })))
}

/// Owners may delete their own bookings, admins may delete any.
pub async fn delete_booking(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let service = BookingService::new(state.db_pool.clone());
    let booking = service.get_reservation(id).await?;
    if !user.is_admin() && !booking.is_owned_by(&user.email) {
        tracing::warn!("{} attempted to delete reservation {} owned by {}", user.email, id, booking.email);
        return Err(ApiError::Forbidden);
    }

    service.delete_reservation(id).await?;
    Ok(Json(json!({ "message": "Booking deleted successfully" })))
}
