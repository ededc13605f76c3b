use serde::{Deserialize, Serialize};

/// A catalog movie as TMDB returns it. Fetched on demand, never persisted
/// beyond the current view.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Movie {
    pub id: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub original_language: Option<String>,
}

/// One page of paginated catalog results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoviePage {
    pub page: i64,
    pub results: Vec<Movie>,
    pub total_pages: i64,
    pub total_results: i64,
}

/// Error body shape TMDB uses for failed requests.
#[derive(Debug, Deserialize)]
pub struct TmdbErrorBody {
    #[serde(default)]
    pub status_message: Option<String>,
    #[serde(default)]
    pub status_code: Option<i64>,
}
