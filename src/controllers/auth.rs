use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;

use super::{api_error, ApiResult};
use crate::{middleware::AuthUser, models::UserRole, services::accounts::Registration, AppState};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/me", get(me))
}

#[derive(Debug, Serialize)]
struct UserResponse {
    id: i64,
    name: String,
    email: String,
    role: UserRole,
}

// POST /api/auth/register
async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<Registration>,
) -> ApiResult<impl IntoResponse> {
    let user = state.accounts.register(req).await.map_err(api_error)?;
    Ok((
        StatusCode::CREATED,
        Json(UserResponse { id: user.id, name: user.name, email: user.email, role: user.role }),
    ))
}

// GET /api/me
async fn me(user: AuthUser) -> impl IntoResponse {
    Json(UserResponse { id: user.user_id, name: user.name, email: user.email, role: user.role })
}
