use axum::{extract::State, Json};
use serde::Deserialize;

use super::error::ApiResult;
use super::favorites::check_movie_id;
use crate::db::{TrendingMovie, TrendingRepo, TrendingUpsert};
use crate::server::AppState;

const TOP_TRENDING: i64 = 10;

#[derive(Debug, Deserialize)]
pub struct IncrementBody {
    #[serde(rename = "movieId")]
    pub movie_id: i64,
    pub title: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub release_date: Option<String>,
}

pub async fn increment(
    State(state): State<AppState>,
    Json(body): Json<IncrementBody>,
) -> ApiResult<Json<TrendingMovie>> {
    check_movie_id(body.movie_id)?;
    let row = state
        .db
        .increment_trending(&TrendingUpsert {
            movieid: body.movie_id,
            title: body.title,
            poster_path: body.poster_path,
            vote_average: body.vote_average.unwrap_or(0.0),
            release_date: body.release_date.unwrap_or_else(|| "N/A".to_string()),
        })
        .await?;
    Ok(Json(row))
}

pub async fn top_trending(State(state): State<AppState>) -> ApiResult<Json<Vec<TrendingMovie>>> {
    let rows = state.db.top_trending(TOP_TRENDING).await?;
    Ok(Json(rows))
}
