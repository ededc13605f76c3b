use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

use super::auth::CurrentUser;
use super::error::{ApiError, ApiResult};
use super::favorites::check_movie_id;
use crate::server::AppState;
use crate::util::is_valid_rating;

fn page_param(params: &HashMap<String, String>) -> ApiResult<i64> {
    match params.get("page") {
        None => Ok(1),
        Some(raw) => match raw.parse::<i64>() {
            Ok(page) if page >= 1 => Ok(page),
            _ => Err(ApiError::invalid_field("page", "must be a positive integer")),
        },
    }
}

pub async fn popular(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Json<Value>> {
    let page = page_param(&params)?;
    Ok(Json(state.catalog.popular(page).await?))
}

pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Json<Value>> {
    let query = params
        .get("query")
        .map(|q| q.trim())
        .filter(|q| !q.is_empty())
        .ok_or_else(|| ApiError::invalid_field("query", "must not be empty"))?;
    let page = page_param(&params)?;
    Ok(Json(state.catalog.search(query, page).await?))
}

pub async fn by_genre(
    State(state): State<AppState>,
    Path(genre_id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Json<Value>> {
    let page = page_param(&params)?;
    Ok(Json(state.catalog.by_genre(&genre_id, page).await?))
}

pub async fn movie_details(
    State(state): State<AppState>,
    Path(movie_id): Path<i64>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Json<Value>> {
    check_movie_id(movie_id)?;
    let append = params.get("append_to_response").map(|s| s.as_str());
    Ok(Json(state.catalog.movie_details(movie_id, append).await?))
}

#[derive(Debug, Deserialize)]
pub struct TmdbFavoriteBody {
    #[serde(rename = "movieId")]
    pub movie_id: i64,
    pub favorite: bool,
}

#[derive(Debug, Deserialize)]
pub struct TmdbWatchlistBody {
    #[serde(rename = "movieId")]
    pub movie_id: i64,
    pub watchlist: bool,
}

#[derive(Debug, Deserialize)]
pub struct TmdbRatingBody {
    #[serde(rename = "movieId")]
    pub movie_id: i64,
    pub rating: f64,
}

pub async fn set_favorite(
    State(state): State<AppState>,
    _user: CurrentUser,
    Json(body): Json<TmdbFavoriteBody>,
) -> ApiResult<Json<Value>> {
    check_movie_id(body.movie_id)?;
    Ok(Json(
        state.catalog.set_favorite(body.movie_id, body.favorite).await?,
    ))
}

pub async fn set_watchlist(
    State(state): State<AppState>,
    _user: CurrentUser,
    Json(body): Json<TmdbWatchlistBody>,
) -> ApiResult<Json<Value>> {
    check_movie_id(body.movie_id)?;
    Ok(Json(
        state
            .catalog
            .set_watchlist(body.movie_id, body.watchlist)
            .await?,
    ))
}

pub async fn rate_movie(
    State(state): State<AppState>,
    _user: CurrentUser,
    Json(body): Json<TmdbRatingBody>,
) -> ApiResult<Json<Value>> {
    check_movie_id(body.movie_id)?;
    if !is_valid_rating(body.rating) {
        return Err(ApiError::invalid_field(
            "rating",
            "must be a multiple of 0.5 in [0.5, 10]",
        ));
    }
    Ok(Json(
        state.catalog.rate_movie(body.movie_id, body.rating).await?,
    ))
}

pub async fn delete_rating(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(movie_id): Path<i64>,
) -> ApiResult<Json<Value>> {
    check_movie_id(movie_id)?;
    Ok(Json(state.catalog.delete_rating(movie_id).await?))
}

#[derive(Debug, Deserialize)]
pub struct ListItemBody {
    #[serde(rename = "movieId")]
    pub movie_id: i64,
}

pub async fn list_add_item(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(list_id): Path<String>,
    Json(body): Json<ListItemBody>,
) -> ApiResult<Json<Value>> {
    check_movie_id(body.movie_id)?;
    Ok(Json(
        state.catalog.list_add_item(&list_id, body.movie_id).await?,
    ))
}

pub async fn list_remove_item(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(list_id): Path<String>,
    Json(body): Json<ListItemBody>,
) -> ApiResult<Json<Value>> {
    check_movie_id(body.movie_id)?;
    Ok(Json(
        state
            .catalog
            .list_remove_item(&list_id, body.movie_id)
            .await?,
    ))
}

pub async fn account_favorites(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Json<Value>> {
    let page = page_param(&params)?;
    Ok(Json(state.catalog.account_favorites(page).await?))
}

pub async fn account_watchlist(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Json<Value>> {
    let page = page_param(&params)?;
    Ok(Json(state.catalog.account_watchlist(page).await?))
}

pub async fn account_rated(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Json<Value>> {
    let page = page_param(&params)?;
    Ok(Json(state.catalog.account_rated(page).await?))
}

pub async fn account_lists(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Json<Value>> {
    let page = page_param(&params)?;
    Ok(Json(state.catalog.account_lists(page).await?))
}

pub async fn account_list_details(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(list_id): Path<String>,
) -> ApiResult<Json<Value>> {
    Ok(Json(state.catalog.list_details(&list_id).await?))
}
