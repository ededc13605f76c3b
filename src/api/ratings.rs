use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::json;

use super::auth::CurrentUser;
use super::error::{ApiError, ApiResult};
use super::favorites::check_movie_id;
use crate::db::{Rating, RatingRepo};
use crate::server::AppState;
use crate::util::is_valid_rating;

#[derive(Debug, Deserialize)]
pub struct RatingBody {
    #[serde(rename = "movieId")]
    pub movie_id: i64,
    pub rating: f64,
}

fn check_rating_value(rating: f64) -> ApiResult<()> {
    if !is_valid_rating(rating) {
        return Err(ApiError::invalid_field(
            "rating",
            "must be a multiple of 0.5 in [0.5, 10]",
        ));
    }
    Ok(())
}

pub async fn list_ratings(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ApiResult<Json<Vec<Rating>>> {
    let ratings = state.db.list_ratings(&user.0.id).await?;
    Ok(Json(ratings))
}

pub async fn upsert_rating(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(body): Json<RatingBody>,
) -> ApiResult<(StatusCode, Json<Rating>)> {
    check_movie_id(body.movie_id)?;
    check_rating_value(body.rating)?;
    let rating = state
        .db
        .upsert_rating(&user.0.id, body.movie_id, body.rating)
        .await?;
    Ok((StatusCode::CREATED, Json(rating)))
}

pub async fn delete_rating(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(movie_id): Path<i64>,
) -> ApiResult<StatusCode> {
    check_movie_id(movie_id)?;
    state.db.delete_rating(&user.0.id, movie_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn check_rating(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(movie_id): Path<i64>,
) -> ApiResult<Json<serde_json::Value>> {
    check_movie_id(movie_id)?;
    let rating = state.db.get_rating(&user.0.id, movie_id).await?;
    Ok(Json(json!({ "rating": rating })))
}
