use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{patch, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use super::{api_error, ok_message, to_api_error, ApiResult};
use crate::{middleware::AuthUser, services::booking::ReserveSeat, AppState};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/bookings", post(create_booking))
        .route("/bookings/cancel", patch(cancel_booking))
        .route("/bookings/pay", post(pay_booking))
}

/* ---------- helpers ---------- */

// Бронь должна принадлежать вызывающему. false - брони нет.
async fn check_owner(state: &AppState, booking_id: i64, user: &AuthUser) -> ApiResult<bool> {
    let booking = state.store.booking(booking_id).await.map_err(api_error)?;
    match booking {
        Some(b) if b.user_id != user.user_id => {
            tracing::warn!(booking_id, user_id = user.user_id, "foreign booking access refused");
            Err(to_api_error(StatusCode::FORBIDDEN, "Booking belongs to another user"))
        }
        Some(_) => Ok(true),
        None => Ok(false),
    }
}

/* ---------- BOOKINGS ---------- */

// POST /api/bookings
#[derive(Debug, Deserialize, Validate)]
struct CreateBookingRequest {
    #[validate(range(min = 1))]
    seat_id: i64,
    #[validate(range(min = 1))]
    movie_id: i64,
    #[validate(range(min = 1))]
    showtime_id: i64,
}

#[derive(Debug, Serialize)]
struct CreateBookingResponse {
    id: i64,
}

async fn create_booking(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<CreateBookingRequest>,
) -> ApiResult<impl IntoResponse> {
    req.validate().map_err(|e| api_error(e.into()))?;

    let id = state
        .bookings
        .reserve_seat(ReserveSeat {
            seat_id: req.seat_id,
            user_id: user.user_id,
            movie_id: req.movie_id,
            showtime_id: req.showtime_id,
        })
        .await
        .map_err(api_error)?;

    Ok((StatusCode::CREATED, Json(CreateBookingResponse { id })))
}

// PATCH /api/bookings/cancel
#[derive(Debug, Deserialize)]
struct CancelBookingRequest {
    booking_id: i64,
    seat_id: i64,
}

async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<CancelBookingRequest>,
) -> ApiResult<impl IntoResponse> {
    check_owner(&state, req.booking_id, &user).await?;
    state
        .bookings
        .abandon_booking(req.booking_id, req.seat_id)
        .await
        .map_err(api_error)?;
    Ok(ok_message("Booking cancelled"))
}

// POST /api/bookings/pay
#[derive(Debug, Deserialize, Validate)]
struct PayBookingRequest {
    booking_id: i64,
    #[validate(range(exclusive_min = 0.0))]
    amount: f64,
    #[validate(length(min = 1))]
    method: String,
}

async fn pay_booking(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<PayBookingRequest>,
) -> ApiResult<impl IntoResponse> {
    req.validate().map_err(|e| api_error(e.into()))?;

    if !check_owner(&state, req.booking_id, &user).await? {
        return Err(to_api_error(StatusCode::NOT_FOUND, &format!("booking {} not found", req.booking_id)));
    }

    let outcome = state
        .payments
        .process_payment(req.booking_id, req.amount, &req.method)
        .await
        .map_err(api_error)?;
    Ok(Json(outcome))
}
