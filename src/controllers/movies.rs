use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use std::sync::Arc;

use super::{api_error, to_api_error, ApiResult};
use crate::{middleware::AdminUser, models::NewMovie, AppState};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/movies", get(list_movies).post(add_movie))
        .route("/movies/{id}", get(get_movie).delete(delete_movie))
        .route("/movies/by-title/{title}", get(get_movie_by_title))
}

// GET /api/movies
async fn list_movies(State(state): State<Arc<AppState>>) -> ApiResult<impl IntoResponse> {
    let movies = state.catalog.movies().await.map_err(api_error)?;
    Ok(Json(movies))
}

// GET /api/movies/{id}
async fn get_movie(State(state): State<Arc<AppState>>, Path(id): Path<i64>) -> ApiResult<impl IntoResponse> {
    let movie = state.catalog.movie(id).await.map_err(api_error)?;
    Ok(Json(movie))
}

// GET /api/movies/by-title/{title}
async fn get_movie_by_title(
    State(state): State<Arc<AppState>>,
    Path(title): Path<String>,
) -> ApiResult<impl IntoResponse> {
    match state.catalog.movie_by_title(&title).await.map_err(api_error)? {
        Some(movie) => Ok(Json(movie)),
        None => Err(to_api_error(StatusCode::NOT_FOUND, &format!("movie '{}' not found", title.trim()))),
    }
}

// POST /api/movies
async fn add_movie(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Json(req): Json<NewMovie>,
) -> ApiResult<impl IntoResponse> {
    let movie = state.catalog.add_movie(req).await.map_err(api_error)?;
    Ok((StatusCode::CREATED, Json(movie)))
}

// DELETE /api/movies/{id}
async fn delete_movie(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let report = state.cascade.delete_movie(id).await.map_err(api_error)?;
    tracing::info!(movie_id = id, admin = admin.user_id, "movie removed by admin");
    Ok(Json(report))
}
