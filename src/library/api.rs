use async_trait::async_trait;
use reqwest::{header, Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

use crate::middleware::SESSION_COOKIE;

const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("{0}")]
    Validation(String),
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MovieRef {
    #[serde(rename = "movieId")]
    pub movie_id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RatingDto {
    #[serde(rename = "movieId")]
    pub movie_id: i64,
    pub rating: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListSummaryDto {
    pub id: i64,
    pub name: String,
    #[serde(rename = "itemCount")]
    pub item_count: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListDetailsDto {
    pub id: i64,
    pub name: String,
    #[serde(rename = "movieIds")]
    pub movie_ids: Vec<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatedListDto {
    pub id: i64,
    pub name: String,
}

/// The backend's user-library surface, as seen by a client. The cache is
/// written against this trait so tests can substitute the network.
#[async_trait]
pub trait UserLibraryApi: Send + Sync {
    async fn fetch_favorites(&self) -> Result<Vec<i64>, ClientError>;
    async fn fetch_watchlist(&self) -> Result<Vec<i64>, ClientError>;
    async fn fetch_ratings(&self) -> Result<Vec<RatingDto>, ClientError>;
    async fn fetch_lists(&self) -> Result<Vec<ListSummaryDto>, ClientError>;
    async fn fetch_list_details(&self, list_id: i64) -> Result<ListDetailsDto, ClientError>;

    async fn add_favorite(&self, movie_id: i64) -> Result<(), ClientError>;
    async fn remove_favorite(&self, movie_id: i64) -> Result<(), ClientError>;
    async fn add_watchlist(&self, movie_id: i64) -> Result<(), ClientError>;
    async fn remove_watchlist(&self, movie_id: i64) -> Result<(), ClientError>;
    async fn rate(&self, movie_id: i64, value: f64) -> Result<(), ClientError>;
    async fn unrate(&self, movie_id: i64) -> Result<(), ClientError>;
    async fn create_list(&self, name: &str) -> Result<CreatedListDto, ClientError>;
    async fn delete_list(&self, list_id: i64) -> Result<(), ClientError>;
    async fn add_movie_to_list(&self, list_id: i64, movie_id: i64) -> Result<(), ClientError>;
    async fn remove_movie_from_list(&self, list_id: i64, movie_id: i64) -> Result<(), ClientError>;
}

/// Error body the backend sends on failure.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: Option<String>,
}

/// reqwest-backed implementation that attaches the session cookie to
/// every request.
pub struct LibraryHttpClient {
    client: Client,
    base_url: String,
    session_token: String,
}

impl LibraryHttpClient {
    pub fn new(base_url: &str, session_token: &str) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            session_token: session_token.to_string(),
        })
    }

    /// Issue a request and interpret the response per the client contract:
    /// non-2xx becomes a structured error with status and body message,
    /// 204/empty body is a valid "no data" success, and a JSON parse
    /// failure on a 2xx degrades to `None` rather than an error.
    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Option<T>, ClientError> {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self
            .client
            .request(method, &url)
            .header(
                header::COOKIE,
                format!("{}={}", SESSION_COOKIE, self.session_token),
            )
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(body) = body {
            req = req.json(&body);
        }

        let response = req.send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response
                .json::<ApiErrorBody>()
                .await
                .ok()
                .and_then(|b| b.message)
                .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            });
        }

        if status == StatusCode::NO_CONTENT {
            return Ok(None);
        }

        let text = response.text().await?;
        if text.is_empty() {
            return Ok(None);
        }
        Ok(serde_json::from_str(&text).ok())
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, ClientError> {
        self.request(Method::GET, path, None).await
    }
}

#[async_trait]
impl UserLibraryApi for LibraryHttpClient {
    async fn fetch_favorites(&self) -> Result<Vec<i64>, ClientError> {
        let refs: Option<Vec<MovieRef>> = self.get("/api/favorites").await?;
        Ok(refs
            .unwrap_or_default()
            .into_iter()
            .map(|r| r.movie_id)
            .collect())
    }

    async fn fetch_watchlist(&self) -> Result<Vec<i64>, ClientError> {
        let refs: Option<Vec<MovieRef>> = self.get("/api/watchlist").await?;
        Ok(refs
            .unwrap_or_default()
            .into_iter()
            .map(|r| r.movie_id)
            .collect())
    }

    async fn fetch_ratings(&self) -> Result<Vec<RatingDto>, ClientError> {
        let ratings: Option<Vec<RatingDto>> = self.get("/api/ratings").await?;
        Ok(ratings.unwrap_or_default())
    }

    async fn fetch_lists(&self) -> Result<Vec<ListSummaryDto>, ClientError> {
        let lists: Option<Vec<ListSummaryDto>> = self.get("/api/lists").await?;
        Ok(lists.unwrap_or_default())
    }

    async fn fetch_list_details(&self, list_id: i64) -> Result<ListDetailsDto, ClientError> {
        let details: Option<ListDetailsDto> =
            self.get(&format!("/api/lists/{}", list_id)).await?;
        details.ok_or_else(|| ClientError::Api {
            status: 404,
            message: format!("List not found: {}", list_id),
        })
    }

    async fn add_favorite(&self, movie_id: i64) -> Result<(), ClientError> {
        self.request::<Value>(
            Method::POST,
            "/api/favorites",
            Some(json!({ "movieId": movie_id })),
        )
        .await?;
        Ok(())
    }

    async fn remove_favorite(&self, movie_id: i64) -> Result<(), ClientError> {
        self.request::<Value>(Method::DELETE, &format!("/api/favorites/{}", movie_id), None)
            .await?;
        Ok(())
    }

    async fn add_watchlist(&self, movie_id: i64) -> Result<(), ClientError> {
        self.request::<Value>(
            Method::POST,
            "/api/watchlist",
            Some(json!({ "movieId": movie_id })),
        )
        .await?;
        Ok(())
    }

    async fn remove_watchlist(&self, movie_id: i64) -> Result<(), ClientError> {
        self.request::<Value>(Method::DELETE, &format!("/api/watchlist/{}", movie_id), None)
            .await?;
        Ok(())
    }

    async fn rate(&self, movie_id: i64, value: f64) -> Result<(), ClientError> {
        self.request::<Value>(
            Method::POST,
            "/api/ratings",
            Some(json!({ "movieId": movie_id, "rating": value })),
        )
        .await?;
        Ok(())
    }

    async fn unrate(&self, movie_id: i64) -> Result<(), ClientError> {
        self.request::<Value>(Method::DELETE, &format!("/api/ratings/{}", movie_id), None)
            .await?;
        Ok(())
    }

    async fn create_list(&self, name: &str) -> Result<CreatedListDto, ClientError> {
        let created: Option<CreatedListDto> = self
            .request(Method::POST, "/api/lists", Some(json!({ "name": name })))
            .await?;
        created.ok_or_else(|| ClientError::Api {
            status: 500,
            message: "Create list returned no body".to_string(),
        })
    }

    async fn delete_list(&self, list_id: i64) -> Result<(), ClientError> {
        self.request::<Value>(Method::DELETE, &format!("/api/lists/{}", list_id), None)
            .await?;
        Ok(())
    }

    async fn add_movie_to_list(&self, list_id: i64, movie_id: i64) -> Result<(), ClientError> {
        self.request::<Value>(
            Method::POST,
            &format!("/api/lists/{}/movies", list_id),
            Some(json!({ "movieId": movie_id })),
        )
        .await?;
        Ok(())
    }

    async fn remove_movie_from_list(&self, list_id: i64, movie_id: i64) -> Result<(), ClientError> {
        self.request::<Value>(
            Method::DELETE,
            &format!("/api/lists/{}/movies/{}", list_id, movie_id),
            None,
        )
        .await?;
        Ok(())
    }
}
