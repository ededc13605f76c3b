use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::{error, info};

use super::model::*;
use super::repo::*;

pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    pub async fn new(db_path: &str) -> DbResult<Self> {
        let options = SqliteConnectOptions::from_str(db_path)?
            .create_if_missing(true)
            .foreign_keys(true);

        // An in-memory database is private to its connection; a pool of
        // one keeps the schema visible across queries.
        let max_connections = if db_path.contains(":memory:") || db_path.contains("mode=memory") {
            1
        } else {
            5
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        let repo = Self { pool };

        repo.init_schema().await?;

        info!("Database initialized at {}", db_path);

        Ok(repo)
    }

    async fn init_schema(&self) -> DbResult<()> {
        let schema = include_str!("schema.sql");
        sqlx::query(schema).execute(&self.pool).await?;
        Ok(())
    }

    pub fn start_background_tasks(self: Arc<Self>) {
        let repo = Arc::clone(&self);
        tokio::spawn(async move {
            repo.session_purge_loop().await;
        });
    }

    async fn session_purge_loop(&self) {
        let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(3600));
        loop {
            interval.tick().await;
            match self.purge_expired_sessions().await {
                Ok(n) if n > 0 => info!("Purged {} expired sessions", n),
                Ok(_) => {}
                Err(e) => error!("Failed to purge expired sessions: {}", e),
            }
        }
    }

    async fn owns_list(&self, user_id: &str, list_id: i64) -> DbResult<bool> {
        let row: Option<(i64,)> =
            sqlx::query_as("SELECT id FROM lists WHERE id = ? AND userid = ?")
                .bind(list_id)
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.is_some())
    }
}

#[async_trait]
impl UserRepo for SqliteRepository {
    async fn get_user_by_email(&self, email: &str) -> DbResult<User> {
        sqlx::query_as::<_, User>(
            "SELECT id, email, name, password, created FROM users WHERE email = ?",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => DbError::NotFound(format!("User not found: {}", email)),
            _ => DbError::Sqlx(e),
        })
    }

    async fn get_user_by_id(&self, id: &str) -> DbResult<User> {
        sqlx::query_as::<_, User>(
            "SELECT id, email, name, password, created FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => DbError::NotFound(format!("User not found: {}", id)),
            _ => DbError::Sqlx(e),
        })
    }

    async fn create_user(&self, user: &User) -> DbResult<()> {
        let result = sqlx::query(
            "INSERT INTO users (id, email, name, password, created) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&user.id)
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.password)
        .bind(user.created)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(
                DbError::AlreadyExists(format!("User already exists: {}", user.email)),
            ),
            Err(e) => Err(DbError::Sqlx(e)),
        }
    }
}

#[async_trait]
impl SessionRepo for SqliteRepository {
    async fn get_session(&self, token: &str) -> DbResult<Session> {
        let session = sqlx::query_as::<_, Session>(
            "SELECT token, userid, created, expires FROM sessions WHERE token = ?",
        )
        .bind(token)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => DbError::NotFound("Session not found".to_string()),
            _ => DbError::Sqlx(e),
        })?;

        if session.expires < Utc::now() {
            return Err(DbError::NotFound("Session expired".to_string()));
        }
        Ok(session)
    }

    async fn create_session(&self, session: &Session) -> DbResult<()> {
        sqlx::query("INSERT INTO sessions (token, userid, created, expires) VALUES (?, ?, ?, ?)")
            .bind(&session.token)
            .bind(&session.userid)
            .bind(session.created)
            .bind(session.expires)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_session(&self, token: &str) -> DbResult<()> {
        sqlx::query("DELETE FROM sessions WHERE token = ?")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn purge_expired_sessions(&self) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires < ?")
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl FavoriteRepo for SqliteRepository {
    async fn list_favorites(&self, user_id: &str) -> DbResult<Vec<Favorite>> {
        let rows = sqlx::query_as::<_, Favorite>(
            "SELECT userid, movieid FROM favorites WHERE userid = ? ORDER BY rowid DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn add_favorite(&self, user_id: &str, movie_id: i64) -> DbResult<Favorite> {
        // Duplicate adds coalesce on the unique key, no error.
        sqlx::query("INSERT OR IGNORE INTO favorites (userid, movieid) VALUES (?, ?)")
            .bind(user_id)
            .bind(movie_id)
            .execute(&self.pool)
            .await?;
        Ok(Favorite {
            userid: user_id.to_string(),
            movieid: movie_id,
        })
    }

    async fn remove_favorite(&self, user_id: &str, movie_id: i64) -> DbResult<()> {
        sqlx::query("DELETE FROM favorites WHERE userid = ? AND movieid = ?")
            .bind(user_id)
            .bind(movie_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn has_favorite(&self, user_id: &str, movie_id: i64) -> DbResult<bool> {
        let row: Option<(i64,)> =
            sqlx::query_as("SELECT movieid FROM favorites WHERE userid = ? AND movieid = ?")
                .bind(user_id)
                .bind(movie_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.is_some())
    }
}

#[async_trait]
impl WatchlistRepo for SqliteRepository {
    async fn list_watchlist(&self, user_id: &str) -> DbResult<Vec<WatchlistEntry>> {
        let rows = sqlx::query_as::<_, WatchlistEntry>(
            "SELECT userid, movieid FROM watchlist WHERE userid = ? ORDER BY rowid DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn add_watchlist(&self, user_id: &str, movie_id: i64) -> DbResult<WatchlistEntry> {
        sqlx::query("INSERT OR IGNORE INTO watchlist (userid, movieid) VALUES (?, ?)")
            .bind(user_id)
            .bind(movie_id)
            .execute(&self.pool)
            .await?;
        Ok(WatchlistEntry {
            userid: user_id.to_string(),
            movieid: movie_id,
        })
    }

    async fn remove_watchlist(&self, user_id: &str, movie_id: i64) -> DbResult<()> {
        sqlx::query("DELETE FROM watchlist WHERE userid = ? AND movieid = ?")
            .bind(user_id)
            .bind(movie_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn has_watchlist(&self, user_id: &str, movie_id: i64) -> DbResult<bool> {
        let row: Option<(i64,)> =
            sqlx::query_as("SELECT movieid FROM watchlist WHERE userid = ? AND movieid = ?")
                .bind(user_id)
                .bind(movie_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.is_some())
    }
}

#[async_trait]
impl RatingRepo for SqliteRepository {
    async fn list_ratings(&self, user_id: &str) -> DbResult<Vec<Rating>> {
        let rows = sqlx::query_as::<_, Rating>(
            "SELECT userid, movieid, rating FROM ratings WHERE userid = ?",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn upsert_rating(&self, user_id: &str, movie_id: i64, rating: f64) -> DbResult<Rating> {
        sqlx::query(
            "INSERT INTO ratings (userid, movieid, rating) VALUES (?, ?, ?)
             ON CONFLICT(userid, movieid) DO UPDATE SET rating = excluded.rating",
        )
        .bind(user_id)
        .bind(movie_id)
        .bind(rating)
        .execute(&self.pool)
        .await?;
        Ok(Rating {
            userid: user_id.to_string(),
            movieid: movie_id,
            rating,
        })
    }

    async fn delete_rating(&self, user_id: &str, movie_id: i64) -> DbResult<()> {
        sqlx::query("DELETE FROM ratings WHERE userid = ? AND movieid = ?")
            .bind(user_id)
            .bind(movie_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_rating(&self, user_id: &str, movie_id: i64) -> DbResult<Option<f64>> {
        let row: Option<(f64,)> =
            sqlx::query_as("SELECT rating FROM ratings WHERE userid = ? AND movieid = ?")
                .bind(user_id)
                .bind(movie_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|(r,)| r))
    }
}

#[async_trait]
impl ListRepo for SqliteRepository {
    async fn list_lists(&self, user_id: &str) -> DbResult<Vec<ListSummary>> {
        let rows = sqlx::query_as::<_, ListSummary>(
            "SELECT l.id, l.name, l.created, COUNT(m.movieid) AS item_count
             FROM lists l LEFT JOIN listmovies m ON m.listid = l.id
             WHERE l.userid = ?
             GROUP BY l.id
             ORDER BY l.id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn get_list(&self, user_id: &str, list_id: i64) -> DbResult<ListDetails> {
        let list = sqlx::query_as::<_, List>(
            "SELECT id, userid, name, created FROM lists WHERE id = ? AND userid = ?",
        )
        .bind(list_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => DbError::NotFound(format!("List not found: {}", list_id)),
            _ => DbError::Sqlx(e),
        })?;

        let movie_ids: Vec<(i64,)> =
            sqlx::query_as("SELECT movieid FROM listmovies WHERE listid = ? ORDER BY rowid")
                .bind(list_id)
                .fetch_all(&self.pool)
                .await?;

        Ok(ListDetails {
            id: list.id,
            name: list.name,
            created: list.created,
            movie_ids: movie_ids.into_iter().map(|(id,)| id).collect(),
        })
    }

    async fn create_list(&self, user_id: &str, name: &str) -> DbResult<List> {
        let created = Utc::now();
        let result = sqlx::query("INSERT INTO lists (userid, name, created) VALUES (?, ?, ?)")
            .bind(user_id)
            .bind(name)
            .bind(created)
            .execute(&self.pool)
            .await?;
        Ok(List {
            id: result.last_insert_rowid(),
            userid: user_id.to_string(),
            name: name.to_string(),
            created: Some(created),
        })
    }

    async fn delete_list(&self, user_id: &str, list_id: i64) -> DbResult<()> {
        // Memberships cascade via the foreign key.
        let result = sqlx::query("DELETE FROM lists WHERE id = ? AND userid = ?")
            .bind(list_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::NotFound(format!("List not found: {}", list_id)));
        }
        Ok(())
    }

    async fn add_list_movie(&self, user_id: &str, list_id: i64, movie_id: i64) -> DbResult<()> {
        if !self.owns_list(user_id, list_id).await? {
            return Err(DbError::NotFound(format!("List not found: {}", list_id)));
        }
        sqlx::query("INSERT OR IGNORE INTO listmovies (listid, movieid) VALUES (?, ?)")
            .bind(list_id)
            .bind(movie_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn remove_list_movie(&self, user_id: &str, list_id: i64, movie_id: i64) -> DbResult<()> {
        if !self.owns_list(user_id, list_id).await? {
            return Err(DbError::NotFound(format!("List not found: {}", list_id)));
        }
        sqlx::query("DELETE FROM listmovies WHERE listid = ? AND movieid = ?")
            .bind(list_id)
            .bind(movie_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl TrendingRepo for SqliteRepository {
    async fn increment_trending(&self, movie: &TrendingUpsert) -> DbResult<TrendingMovie> {
        sqlx::query(
            "INSERT INTO trending (movieid, title, poster_path, vote_average, release_date, count)
             VALUES (?, ?, ?, ?, ?, 1)
             ON CONFLICT(movieid) DO UPDATE SET
                count = count + 1,
                title = excluded.title,
                poster_path = excluded.poster_path,
                vote_average = excluded.vote_average,
                release_date = excluded.release_date",
        )
        .bind(movie.movieid)
        .bind(&movie.title)
        .bind(&movie.poster_path)
        .bind(movie.vote_average)
        .bind(&movie.release_date)
        .execute(&self.pool)
        .await?;

        let row = sqlx::query_as::<_, TrendingMovie>(
            "SELECT movieid, title, poster_path, vote_average, release_date, count
             FROM trending WHERE movieid = ?",
        )
        .bind(movie.movieid)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn top_trending(&self, n: i64) -> DbResult<Vec<TrendingMovie>> {
        let rows = sqlx::query_as::<_, TrendingMovie>(
            "SELECT movieid, title, poster_path, vote_average, release_date, count
             FROM trending ORDER BY count DESC, movieid ASC LIMIT ?",
        )
        .bind(n)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

impl Repository for SqliteRepository {
    fn close(&self) {
        let pool = self.pool.clone();
        tokio::spawn(async move {
            pool.close().await;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_repo() -> SqliteRepository {
        SqliteRepository::new("sqlite::memory:").await.unwrap()
    }

    async fn test_user(repo: &SqliteRepository) -> User {
        let user = User {
            id: uuid::Uuid::new_v4().to_string(),
            email: format!("{}@example.com", uuid::Uuid::new_v4()),
            name: "Test".to_string(),
            password: "hash".to_string(),
            created: Some(Utc::now()),
        };
        repo.create_user(&user).await.unwrap();
        user
    }

    #[tokio::test]
    async fn favorite_add_remove_round_trip() {
        let repo = test_repo().await;
        let user = test_user(&repo).await;

        repo.add_favorite(&user.id, 42).await.unwrap();
        assert!(repo.has_favorite(&user.id, 42).await.unwrap());

        // Duplicate add coalesces.
        repo.add_favorite(&user.id, 42).await.unwrap();
        assert_eq!(repo.list_favorites(&user.id).await.unwrap().len(), 1);

        repo.remove_favorite(&user.id, 42).await.unwrap();
        assert!(!repo.has_favorite(&user.id, 42).await.unwrap());
        assert!(repo.list_favorites(&user.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn rating_upsert_overwrites() {
        let repo = test_repo().await;
        let user = test_user(&repo).await;

        repo.upsert_rating(&user.id, 7, 6.5).await.unwrap();
        repo.upsert_rating(&user.id, 7, 9.0).await.unwrap();
        assert_eq!(repo.get_rating(&user.id, 7).await.unwrap(), Some(9.0));
        assert_eq!(repo.list_ratings(&user.id).await.unwrap().len(), 1);

        repo.delete_rating(&user.id, 7).await.unwrap();
        assert_eq!(repo.get_rating(&user.id, 7).await.unwrap(), None);

        // Deleting an absent rating is a no-op.
        repo.delete_rating(&user.id, 7).await.unwrap();
    }

    #[tokio::test]
    async fn list_delete_cascades_memberships() {
        let repo = test_repo().await;
        let user = test_user(&repo).await;

        let list = repo.create_list(&user.id, "Noir").await.unwrap();
        repo.add_list_movie(&user.id, list.id, 1).await.unwrap();
        repo.add_list_movie(&user.id, list.id, 2).await.unwrap();
        // Duplicate membership is a set no-op.
        repo.add_list_movie(&user.id, list.id, 2).await.unwrap();

        let summary = &repo.list_lists(&user.id).await.unwrap()[0];
        assert_eq!(summary.item_count, 2);

        repo.delete_list(&user.id, list.id).await.unwrap();
        assert!(matches!(
            repo.get_list(&user.id, list.id).await,
            Err(DbError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn list_ops_reject_foreign_user() {
        let repo = test_repo().await;
        let owner = test_user(&repo).await;
        let other = test_user(&repo).await;

        let list = repo.create_list(&owner.id, "Mine").await.unwrap();
        assert!(matches!(
            repo.add_list_movie(&other.id, list.id, 1).await,
            Err(DbError::NotFound(_))
        ));
        assert!(matches!(
            repo.get_list(&other.id, list.id).await,
            Err(DbError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn trending_increment_and_top() {
        let repo = test_repo().await;

        let up = |id: i64, title: &str| TrendingUpsert {
            movieid: id,
            title: title.to_string(),
            poster_path: None,
            vote_average: 7.0,
            release_date: "2021-05-01".to_string(),
        };

        repo.increment_trending(&up(1, "First")).await.unwrap();
        repo.increment_trending(&up(2, "Second")).await.unwrap();
        let row = repo.increment_trending(&up(2, "Second v2")).await.unwrap();
        assert_eq!(row.count, 2);
        // Snapshot is overwritten on every increment.
        assert_eq!(row.title, "Second v2");

        let top = repo.top_trending(10).await.unwrap();
        assert_eq!(top[0].movieid, 2);
        assert_eq!(top[1].movieid, 1);

        let capped = repo.top_trending(1).await.unwrap();
        assert_eq!(capped.len(), 1);
    }
}
