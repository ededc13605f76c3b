use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::json;

use super::auth::CurrentUser;
use super::error::{ApiError, ApiResult};
use crate::db::{Favorite, FavoriteRepo};
use crate::server::AppState;
use crate::util::is_valid_movie_id;

#[derive(Debug, Deserialize)]
pub struct MovieIdBody {
    #[serde(rename = "movieId")]
    pub movie_id: i64,
}

pub fn check_movie_id(movie_id: i64) -> ApiResult<()> {
    if !is_valid_movie_id(movie_id) {
        return Err(ApiError::invalid_field("movieId", "must be a positive integer"));
    }
    Ok(())
}

pub async fn list_favorites(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ApiResult<Json<Vec<Favorite>>> {
    let favorites = state.db.list_favorites(&user.0.id).await?;
    Ok(Json(favorites))
}

pub async fn add_favorite(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(body): Json<MovieIdBody>,
) -> ApiResult<(StatusCode, Json<Favorite>)> {
    check_movie_id(body.movie_id)?;
    let favorite = state.db.add_favorite(&user.0.id, body.movie_id).await?;
    Ok((StatusCode::CREATED, Json(favorite)))
}

pub async fn remove_favorite(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(movie_id): Path<i64>,
) -> ApiResult<StatusCode> {
    check_movie_id(movie_id)?;
    state.db.remove_favorite(&user.0.id, movie_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn check_favorite(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(movie_id): Path<i64>,
) -> ApiResult<Json<serde_json::Value>> {
    check_movie_id(movie_id)?;
    let is_favorited = state.db.has_favorite(&user.0.id, movie_id).await?;
    Ok(Json(json!({ "isFavorited": is_favorited })))
}
