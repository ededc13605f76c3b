use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub created: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Session {
    pub token: String,
    pub userid: String,
    pub created: Option<DateTime<Utc>>,
    pub expires: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Favorite {
    pub userid: String,
    #[serde(rename = "movieId")]
    pub movieid: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct WatchlistEntry {
    pub userid: String,
    #[serde(rename = "movieId")]
    pub movieid: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Rating {
    pub userid: String,
    #[serde(rename = "movieId")]
    pub movieid: i64,
    pub rating: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct List {
    pub id: i64,
    pub userid: String,
    pub name: String,
    pub created: Option<DateTime<Utc>>,
}

/// A list plus the number of movies it holds, as returned by `list_lists`.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ListSummary {
    pub id: i64,
    pub name: String,
    pub created: Option<DateTime<Utc>>,
    #[serde(rename = "itemCount")]
    pub item_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListDetails {
    pub id: i64,
    pub name: String,
    pub created: Option<DateTime<Utc>>,
    #[serde(rename = "movieIds")]
    pub movie_ids: Vec<i64>,
}

/// Per-movie interaction counter. The metadata snapshot is overwritten,
/// not merged, on every increment.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TrendingMovie {
    #[serde(rename = "movieId")]
    pub movieid: i64,
    pub title: String,
    pub poster_path: Option<String>,
    pub vote_average: f64,
    pub release_date: String,
    pub count: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Already exists: {0}")]
    AlreadyExists(String),
}

pub type DbResult<T> = Result<T, DbError>;
