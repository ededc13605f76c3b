use async_trait::async_trait;

use super::model::*;

#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn get_user_by_email(&self, email: &str) -> DbResult<User>;
    async fn get_user_by_id(&self, id: &str) -> DbResult<User>;
    async fn create_user(&self, user: &User) -> DbResult<()>;
}

#[async_trait]
pub trait SessionRepo: Send + Sync {
    async fn get_session(&self, token: &str) -> DbResult<Session>;
    async fn create_session(&self, session: &Session) -> DbResult<()>;
    async fn delete_session(&self, token: &str) -> DbResult<()>;
    async fn purge_expired_sessions(&self) -> DbResult<u64>;
}

#[async_trait]
pub trait FavoriteRepo: Send + Sync {
    async fn list_favorites(&self, user_id: &str) -> DbResult<Vec<Favorite>>;
    async fn add_favorite(&self, user_id: &str, movie_id: i64) -> DbResult<Favorite>;
    async fn remove_favorite(&self, user_id: &str, movie_id: i64) -> DbResult<()>;
    async fn has_favorite(&self, user_id: &str, movie_id: i64) -> DbResult<bool>;
}

#[async_trait]
pub trait WatchlistRepo: Send + Sync {
    async fn list_watchlist(&self, user_id: &str) -> DbResult<Vec<WatchlistEntry>>;
    async fn add_watchlist(&self, user_id: &str, movie_id: i64) -> DbResult<WatchlistEntry>;
    async fn remove_watchlist(&self, user_id: &str, movie_id: i64) -> DbResult<()>;
    async fn has_watchlist(&self, user_id: &str, movie_id: i64) -> DbResult<bool>;
}

#[async_trait]
pub trait RatingRepo: Send + Sync {
    async fn list_ratings(&self, user_id: &str) -> DbResult<Vec<Rating>>;
    async fn upsert_rating(&self, user_id: &str, movie_id: i64, rating: f64) -> DbResult<Rating>;
    async fn delete_rating(&self, user_id: &str, movie_id: i64) -> DbResult<()>;
    async fn get_rating(&self, user_id: &str, movie_id: i64) -> DbResult<Option<f64>>;
}

#[async_trait]
pub trait ListRepo: Send + Sync {
    async fn list_lists(&self, user_id: &str) -> DbResult<Vec<ListSummary>>;
    async fn get_list(&self, user_id: &str, list_id: i64) -> DbResult<ListDetails>;
    async fn create_list(&self, user_id: &str, name: &str) -> DbResult<List>;
    async fn delete_list(&self, user_id: &str, list_id: i64) -> DbResult<()>;
    async fn add_list_movie(&self, user_id: &str, list_id: i64, movie_id: i64) -> DbResult<()>;
    async fn remove_list_movie(&self, user_id: &str, list_id: i64, movie_id: i64) -> DbResult<()>;
}

/// Snapshot of catalog metadata recorded alongside each counter bump.
#[derive(Debug, Clone)]
pub struct TrendingUpsert {
    pub movieid: i64,
    pub title: String,
    pub poster_path: Option<String>,
    pub vote_average: f64,
    pub release_date: String,
}

/// Injected storage dependency for the trending leaderboard, swappable
/// and testable without a running server.
#[async_trait]
pub trait TrendingRepo: Send + Sync {
    async fn increment_trending(&self, movie: &TrendingUpsert) -> DbResult<TrendingMovie>;
    async fn top_trending(&self, n: i64) -> DbResult<Vec<TrendingMovie>>;
}

pub trait Repository:
    UserRepo + SessionRepo + FavoriteRepo + WatchlistRepo + RatingRepo + ListRepo + TrendingRepo
{
    fn close(&self);
}
