use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

use super::api::ClientError;
use super::page::cap_total_pages;
use crate::tmdb::{Movie, MoviePage};

const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: Option<String>,
}

/// Catalog queries through the backend's same-origin proxy. No credential
/// is attached; the backend holds the upstream key.
pub struct CatalogApi {
    client: Client,
    base_url: String,
}

impl CatalogApi {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self.client.get(&url).send().await?;
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

        Ok(response.json().await?)
    }

    pub async fn popular(&self, page: i64) -> Result<MoviePage, ClientError> {
        self.get(&format!("/api/tmdb/popular?page={}", page))
            .await
            .map(Self::cap_page)
    }

    pub async fn search(&self, query: &str, page: i64) -> Result<MoviePage, ClientError> {
        self.get(&format!(
            "/api/tmdb/search?query={}&page={}",
            urlencoding::encode(query),
            page
        ))
        .await
        .map(Self::cap_page)
    }

    pub async fn by_genre(&self, genre_id: &str, page: i64) -> Result<MoviePage, ClientError> {
        self.get(&format!(
            "/api/tmdb/genre/{}?page={}",
            urlencoding::encode(genre_id),
            page
        ))
        .await
        .map(Self::cap_page)
    }

    // The catalog refuses to page past 500; clamp what it reports so
    // callers can't build pagination past that.
    fn cap_page(mut page: MoviePage) -> MoviePage {
        page.total_pages = cap_total_pages(page.total_pages);
        page
    }

    pub async fn movie_details(&self, movie_id: i64, append: Option<&str>) -> Result<Movie, ClientError> {
        let mut path = format!("/api/tmdb/movie/{}", movie_id);
        if let Some(append) = append {
            path.push_str(&format!(
                "?append_to_response={}",
                urlencoding::encode(append)
            ));
        }
        self.get(&path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reported_total_pages_is_clamped() {
        let page = MoviePage {
            page: 1,
            results: Vec::new(),
            total_pages: 12_000,
            total_results: 240_000,
        };
        assert_eq!(CatalogApi::cap_page(page).total_pages, 500);

        let shallow = MoviePage {
            page: 1,
            results: Vec::new(),
            total_pages: 42,
            total_results: 840,
        };
        assert_eq!(CatalogApi::cap_page(shallow).total_pages, 42);
    }
}
