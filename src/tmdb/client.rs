use std::time::Duration;

use reqwest::{Client, Method};
use serde_json::{json, Value};
use tracing::debug;

use super::types::TmdbErrorBody;

const TMDB_BASE_URL: &str = "https://api.themoviedb.org/3";
const TMDB_BASE_URL_V4: &str = "https://api.themoviedb.org/4";
const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, thiserror::Error)]
pub enum TmdbError {
    #[error("TMDB request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("TMDB API error ({status}): {message}")]
    Upstream { status: u16, message: String },
    #[error("TMDB account id is not configured")]
    NoAccount,
}

/// Client for the external movie catalog. The bearer key never leaves the
/// backend; browsers talk to the catalog through the /api/tmdb proxy.
pub struct CatalogClient {
    client: Client,
    auth_key: String,
    account_id: Option<String>,
}

impl CatalogClient {
    pub fn new(auth_key: &str, account_id: Option<String>) -> Result<Self, TmdbError> {
        // Tolerate a key pasted with its scheme included.
        let auth_key = auth_key
            .strip_prefix("Bearer ")
            .unwrap_or(auth_key)
            .to_string();

        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            auth_key,
            account_id,
        })
    }

    async fn request(&self, method: Method, url: &str, body: Option<Value>) -> Result<Value, TmdbError> {
        debug!(method = %method, url = %url, "TMDB request");

        let mut req = self
            .client
            .request(method, url)
            .bearer_auth(&self.auth_key)
            .header("accept", "application/json");
        if let Some(body) = body {
            req = req.json(&body);
        }

        let response = req.send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response
                .json::<TmdbErrorBody>()
                .await
                .ok()
                .and_then(|b| b.status_message)
                .unwrap_or_else(|| format!("TMDB API error ({})", status.as_u16()));
            return Err(TmdbError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }

    async fn get(&self, url: &str) -> Result<Value, TmdbError> {
        self.request(Method::GET, url, None).await
    }

    fn account_id(&self) -> Result<&str, TmdbError> {
        self.account_id.as_deref().ok_or(TmdbError::NoAccount)
    }

    pub async fn popular(&self, page: i64) -> Result<Value, TmdbError> {
        self.get(&format!("{}/movie/popular?page={}", TMDB_BASE_URL, page))
            .await
    }

    pub async fn search(&self, query: &str, page: i64) -> Result<Value, TmdbError> {
        self.get(&format!(
            "{}/search/movie?query={}&page={}",
            TMDB_BASE_URL,
            urlencoding::encode(query),
            page
        ))
        .await
    }

    pub async fn by_genre(&self, genre_id: &str, page: i64) -> Result<Value, TmdbError> {
        self.get(&format!(
            "{}/discover/movie?with_genres={}&page={}&sort_by=popularity.desc",
            TMDB_BASE_URL,
            urlencoding::encode(genre_id),
            page
        ))
        .await
    }

    pub async fn movie_details(&self, movie_id: i64, append: Option<&str>) -> Result<Value, TmdbError> {
        let mut url = format!("{}/movie/{}", TMDB_BASE_URL, movie_id);
        if let Some(append) = append {
            url.push_str(&format!("?append_to_response={}", urlencoding::encode(append)));
        }
        self.get(&url).await
    }

    pub async fn set_favorite(&self, movie_id: i64, favorite: bool) -> Result<Value, TmdbError> {
        let account = self.account_id()?;
        self.request(
            Method::POST,
            &format!("{}/account/{}/favorite", TMDB_BASE_URL, account),
            Some(json!({
                "media_type": "movie",
                "media_id": movie_id,
                "favorite": favorite,
            })),
        )
        .await
    }

    pub async fn set_watchlist(&self, movie_id: i64, watchlist: bool) -> Result<Value, TmdbError> {
        let account = self.account_id()?;
        self.request(
            Method::POST,
            &format!("{}/account/{}/watchlist", TMDB_BASE_URL, account),
            Some(json!({
                "media_type": "movie",
                "media_id": movie_id,
                "watchlist": watchlist,
            })),
        )
        .await
    }

    pub async fn rate_movie(&self, movie_id: i64, rating: f64) -> Result<Value, TmdbError> {
        self.request(
            Method::POST,
            &format!("{}/movie/{}/rating", TMDB_BASE_URL, movie_id),
            Some(json!({ "value": rating })),
        )
        .await
    }

    pub async fn delete_rating(&self, movie_id: i64) -> Result<Value, TmdbError> {
        self.request(
            Method::DELETE,
            &format!("{}/movie/{}/rating", TMDB_BASE_URL, movie_id),
            None,
        )
        .await
    }

    pub async fn list_add_item(&self, list_id: &str, movie_id: i64) -> Result<Value, TmdbError> {
        self.request(
            Method::POST,
            &format!("{}/list/{}/items", TMDB_BASE_URL_V4, urlencoding::encode(list_id)),
            Some(json!({
                "items": [{ "media_type": "movie", "media_id": movie_id }],
            })),
        )
        .await
    }

    pub async fn list_remove_item(&self, list_id: &str, movie_id: i64) -> Result<Value, TmdbError> {
        self.request(
            Method::DELETE,
            &format!("{}/list/{}/items", TMDB_BASE_URL_V4, urlencoding::encode(list_id)),
            Some(json!({
                "items": [{ "media_type": "movie", "media_id": movie_id }],
            })),
        )
        .await
    }

    pub async fn account_favorites(&self, page: i64) -> Result<Value, TmdbError> {
        let account = self.account_id()?;
        self.get(&format!(
            "{}/account/{}/favorite/movies?page={}",
            TMDB_BASE_URL, account, page
        ))
        .await
    }

    pub async fn account_watchlist(&self, page: i64) -> Result<Value, TmdbError> {
        let account = self.account_id()?;
        self.get(&format!(
            "{}/account/{}/watchlist/movies?page={}",
            TMDB_BASE_URL, account, page
        ))
        .await
    }

    pub async fn account_rated(&self, page: i64) -> Result<Value, TmdbError> {
        let account = self.account_id()?;
        self.get(&format!(
            "{}/account/{}/rated/movies?page={}",
            TMDB_BASE_URL, account, page
        ))
        .await
    }

    pub async fn account_lists(&self, page: i64) -> Result<Value, TmdbError> {
        let account = self.account_id()?;
        self.get(&format!(
            "{}/account/{}/lists?page={}",
            TMDB_BASE_URL, account, page
        ))
        .await
    }

    pub async fn list_details(&self, list_id: &str) -> Result<Value, TmdbError> {
        self.get(&format!(
            "{}/list/{}",
            TMDB_BASE_URL_V4,
            urlencoding::encode(list_id)
        ))
        .await
    }
}
