use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

use super::{api_error, ok_message, to_api_error, ApiResult};
use crate::{middleware::AdminUser, services::schedule::ScheduleShowtime, AppState};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/showtimes", get(list_showtimes).post(schedule_showtime))
        .route("/showtimes/all", get(list_all_showtimes))
        .route("/showtimes/validate", post(validate_showtime))
        .route("/showtimes/cleanup", post(purge_past_showtimes))
        .route("/showtimes/{id}", delete(delete_showtime))
        .route("/showtimes/{id}/seats", get(list_seats))
        .route("/seats/initialize", post(initialize_seats))
}

#[derive(Debug, Deserialize)]
pub struct ShowtimesQuery {
    pub movie_id: i64,
    pub date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ValidateShowtimeRequest {
    pub movie_id: i64,
    pub date: String,
    pub time: String,
    pub hall: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct InitializeSeatsRequest {
    pub showtime_id: i64,
    #[validate(range(min = 1, max = 702))]
    pub rows: u32,
    #[validate(range(min = 1, max = 200))]
    pub cols: u32,
}

#[derive(Debug, Serialize)]
struct CreatedResponse {
    id: i64,
}

// GET /api/showtimes?movie_id=1&date=2030-05-01
async fn list_showtimes(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ShowtimesQuery>,
) -> ApiResult<impl IntoResponse> {
    let date = match params.date.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
        Some(raw) => Some(
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map_err(|_| to_api_error(StatusCode::BAD_REQUEST, "date must be YYYY-MM-DD"))?,
        ),
        None => None,
    };
    let showtimes = state.catalog.showtimes(params.movie_id, date).await.map_err(api_error)?;
    Ok(Json(showtimes))
}

// GET /api/showtimes/all
async fn list_all_showtimes(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
) -> ApiResult<impl IntoResponse> {
    let showtimes = state.catalog.all_showtimes().await.map_err(api_error)?;
    Ok(Json(showtimes))
}

// POST /api/showtimes/validate
async fn validate_showtime(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Json(req): Json<ValidateShowtimeRequest>,
) -> ApiResult<impl IntoResponse> {
    state
        .scheduler
        .validate(req.movie_id, &req.date, &req.time, &req.hall)
        .await
        .map_err(api_error)?;
    Ok(ok_message("Showtime slot is available"))
}

// POST /api/showtimes
async fn schedule_showtime(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Json(req): Json<ScheduleShowtime>,
) -> ApiResult<impl IntoResponse> {
    let id = state.scheduler.schedule_showtime(&req).await.map_err(api_error)?;
    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

// DELETE /api/showtimes/{id}
async fn delete_showtime(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let report = state.cascade.delete_showtime(id).await.map_err(api_error)?;
    Ok(Json(report))
}

// POST /api/showtimes/cleanup
async fn purge_past_showtimes(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
) -> ApiResult<impl IntoResponse> {
    let removed = state
        .cleanup
        .purge_past_showtimes(Local::now().date_naive())
        .await
        .map_err(api_error)?;
    Ok(Json(json!({ "removed": removed })))
}

// GET /api/showtimes/{id}/seats
async fn list_seats(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let seats = state.seats.seats_for_showtime(id).await.map_err(api_error)?;
    Ok(Json(seats))
}

// POST /api/seats/initialize
async fn initialize_seats(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Json(req): Json<InitializeSeatsRequest>,
) -> ApiResult<impl IntoResponse> {
    req.validate().map_err(|e| api_error(e.into()))?;
    let created = state
        .seats
        .initialize_seats(req.showtime_id, req.rows, req.cols)
        .await
        .map_err(api_error)?;
    Ok(Json(json!({ "showtime_id": req.showtime_id, "created": created })))
}
