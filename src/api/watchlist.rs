use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::json;

use super::auth::CurrentUser;
use super::error::ApiResult;
use super::favorites::{check_movie_id, MovieIdBody};
use crate::db::{WatchlistEntry, WatchlistRepo};
use crate::server::AppState;

pub async fn list_watchlist(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ApiResult<Json<Vec<WatchlistEntry>>> {
    let items = state.db.list_watchlist(&user.0.id).await?;
    Ok(Json(items))
}

pub async fn add_watchlist(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(body): Json<MovieIdBody>,
) -> ApiResult<(StatusCode, Json<WatchlistEntry>)> {
    check_movie_id(body.movie_id)?;
    let entry = state.db.add_watchlist(&user.0.id, body.movie_id).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn remove_watchlist(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(movie_id): Path<i64>,
) -> ApiResult<StatusCode> {
    check_movie_id(movie_id)?;
    state.db.remove_watchlist(&user.0.id, movie_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn check_watchlist(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(movie_id): Path<i64>,
) -> ApiResult<Json<serde_json::Value>> {
    check_movie_id(movie_id)?;
    let in_watchlist = state.db.has_watchlist(&user.0.id, movie_id).await?;
    Ok(Json(json!({ "inWatchlist": in_watchlist })))
}
