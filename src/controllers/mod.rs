pub mod auth;
pub mod bookings;
pub mod movies;
pub mod showtimes;

use axum::{http::StatusCode, Json, Router};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

use crate::error::Error;

pub fn routes() -> Router<Arc<crate::AppState>> {
    Router::new()
        .merge(auth::routes())
        .merge(movies::routes())
        .merge(showtimes::routes())
        .merge(bookings::routes())
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    success: bool,
    message: String,
}

pub type ApiResult<T> = Result<T, (StatusCode, Json<ApiError>)>;

pub fn to_api_error(status: StatusCode, message: &str) -> (StatusCode, Json<ApiError>) {
    (status, Json(ApiError { success: false, message: message.to_string() }))
}

pub fn ok_message(message: &str) -> Json<serde_json::Value> {
    Json(json!({ "success": true, "message": message }))
}

pub fn status_for(error: &Error) -> StatusCode {
    match error {
        Error::Validation(_) => StatusCode::BAD_REQUEST,
        Error::NotFound { .. } => StatusCode::NOT_FOUND,
        Error::Conflict(_) => StatusCode::CONFLICT,
        Error::Database(_) | Error::Store(_) | Error::Inconsistent(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Ошибка ядра -> статус + сообщение. Ошибки хранилища в ответ не раскрываются.
pub fn api_error(error: Error) -> (StatusCode, Json<ApiError>) {
    let status = status_for(&error);
    if status.is_server_error() {
        tracing::error!("request failed: {}", error);
    }
    let message = match &error {
        Error::Database(_) | Error::Store(_) => "Database error".to_string(),
        other => other.to_string(),
    };
    to_api_error(status, &message)
}
