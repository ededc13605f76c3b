use std::collections::{HashMap, HashSet};

use tracing::warn;

use super::api::{ClientError, ListSummaryDto, UserLibraryApi};
use super::project::{project_movies, MovieCard};
use crate::tmdb::Movie;
use crate::util::is_valid_rating;

#[derive(Debug, Clone, PartialEq)]
pub struct ListInfo {
    pub name: String,
    pub item_count: usize,
}

/// In-memory mirror of one user's library, hydrated once per session and
/// kept consistent through writes. Every mutation confirms with the server
/// first and only then touches the local state, so a rejected call leaves
/// the mirror in its last-confirmed state. Taking `&mut self` serializes
/// toggles within a session; cross-session drift reconciles on the next
/// hydrate.
pub struct LibraryCache<A> {
    api: A,
    favorites: HashSet<i64>,
    watchlist: HashSet<i64>,
    ratings: HashMap<i64, f64>,
    lists: HashMap<i64, ListInfo>,
    list_members: HashMap<i64, HashSet<i64>>,
}

impl<A: UserLibraryApi> LibraryCache<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            favorites: HashSet::new(),
            watchlist: HashSet::new(),
            ratings: HashMap::new(),
            lists: HashMap::new(),
            list_members: HashMap::new(),
        }
    }

    /// Fetch all four collections concurrently. A failed sub-fetch is
    /// logged and leaves that collection empty; it never blocks the others.
    pub async fn hydrate(&mut self) {
        let (favorites, watchlist, ratings, lists) = tokio::join!(
            self.api.fetch_favorites(),
            self.api.fetch_watchlist(),
            self.api.fetch_ratings(),
            Self::fetch_lists_with_members(&self.api),
        );

        match favorites {
            Ok(ids) => self.favorites = ids.into_iter().collect(),
            Err(e) => warn!("Failed to fetch favorites: {}", e),
        }
        match watchlist {
            Ok(ids) => self.watchlist = ids.into_iter().collect(),
            Err(e) => warn!("Failed to fetch watchlist: {}", e),
        }
        match ratings {
            Ok(entries) => {
                self.ratings = entries.into_iter().map(|r| (r.movie_id, r.rating)).collect()
            }
            Err(e) => warn!("Failed to fetch ratings: {}", e),
        }
        match lists {
            Ok((lists, members)) => {
                self.lists = lists;
                self.list_members = members;
            }
            Err(e) => warn!("Failed to fetch lists: {}", e),
        }
    }

    async fn fetch_lists_with_members(
        api: &A,
    ) -> Result<(HashMap<i64, ListInfo>, HashMap<i64, HashSet<i64>>), ClientError> {
        let summaries: Vec<ListSummaryDto> = api.fetch_lists().await?;

        let mut lists = HashMap::new();
        let mut members = HashMap::new();
        for summary in summaries {
            let details = api.fetch_list_details(summary.id).await?;
            let ids: HashSet<i64> = details.movie_ids.into_iter().collect();
            lists.insert(
                summary.id,
                ListInfo {
                    name: summary.name,
                    item_count: ids.len(),
                },
            );
            members.insert(summary.id, ids);
        }
        Ok((lists, members))
    }

    pub async fn add_favorite(&mut self, movie_id: i64) -> Result<(), ClientError> {
        self.api.add_favorite(movie_id).await?;
        self.favorites.insert(movie_id);
        Ok(())
    }

    pub async fn remove_favorite(&mut self, movie_id: i64) -> Result<(), ClientError> {
        self.api.remove_favorite(movie_id).await?;
        self.favorites.remove(&movie_id);
        Ok(())
    }

    pub async fn add_watchlist(&mut self, movie_id: i64) -> Result<(), ClientError> {
        self.api.add_watchlist(movie_id).await?;
        self.watchlist.insert(movie_id);
        Ok(())
    }

    pub async fn remove_watchlist(&mut self, movie_id: i64) -> Result<(), ClientError> {
        self.api.remove_watchlist(movie_id).await?;
        self.watchlist.remove(&movie_id);
        Ok(())
    }

    pub async fn rate(&mut self, movie_id: i64, value: f64) -> Result<(), ClientError> {
        if !is_valid_rating(value) {
            return Err(ClientError::Validation(format!(
                "Rating {} must be a multiple of 0.5 in [0.5, 10]",
                value
            )));
        }
        self.api.rate(movie_id, value).await?;
        self.ratings.insert(movie_id, value);
        Ok(())
    }

    pub async fn unrate(&mut self, movie_id: i64) -> Result<(), ClientError> {
        self.api.unrate(movie_id).await?;
        self.ratings.remove(&movie_id);
        Ok(())
    }

    pub async fn create_list(&mut self, name: &str) -> Result<i64, ClientError> {
        let created = self.api.create_list(name).await?;
        self.lists.insert(
            created.id,
            ListInfo {
                name: created.name,
                item_count: 0,
            },
        );
        self.list_members.insert(created.id, HashSet::new());
        Ok(created.id)
    }

    pub async fn delete_list(&mut self, list_id: i64) -> Result<(), ClientError> {
        self.api.delete_list(list_id).await?;
        self.lists.remove(&list_id);
        self.list_members.remove(&list_id);
        Ok(())
    }

    pub async fn add_movie_to_list(&mut self, list_id: i64, movie_id: i64) -> Result<(), ClientError> {
        self.api.add_movie_to_list(list_id, movie_id).await?;
        let members = self.list_members.entry(list_id).or_default();
        members.insert(movie_id);
        let count = members.len();
        if let Some(info) = self.lists.get_mut(&list_id) {
            info.item_count = count;
        }
        Ok(())
    }

    pub async fn remove_movie_from_list(
        &mut self,
        list_id: i64,
        movie_id: i64,
    ) -> Result<(), ClientError> {
        self.api.remove_movie_from_list(list_id, movie_id).await?;
        let members = self.list_members.entry(list_id).or_default();
        members.remove(&movie_id);
        let count = members.len();
        if let Some(info) = self.lists.get_mut(&list_id) {
            info.item_count = count;
        }
        Ok(())
    }

    pub fn is_favorite(&self, movie_id: i64) -> bool {
        self.favorites.contains(&movie_id)
    }

    pub fn in_watchlist(&self, movie_id: i64) -> bool {
        self.watchlist.contains(&movie_id)
    }

    pub fn rating_for(&self, movie_id: i64) -> Option<f64> {
        self.ratings.get(&movie_id).copied()
    }

    pub fn lists(&self) -> &HashMap<i64, ListInfo> {
        &self.lists
    }

    pub fn list_members(&self, list_id: i64) -> Option<&HashSet<i64>> {
        self.list_members.get(&list_id)
    }

    pub fn favorites(&self) -> &HashSet<i64> {
        &self.favorites
    }

    pub fn watchlist(&self) -> &HashSet<i64> {
        &self.watchlist
    }

    pub fn ratings(&self) -> &HashMap<i64, f64> {
        &self.ratings
    }

    /// Merge a page of catalog movies with the current mirror.
    pub fn project(&self, movies: &[Movie], fallback_poster: &str) -> Vec<MovieCard> {
        project_movies(
            movies,
            &self.favorites,
            &self.watchlist,
            &self.ratings,
            fallback_poster,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::api::{CreatedListDto, ListDetailsDto, RatingDto};
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MockState {
        favorites: Vec<i64>,
        watchlist: Vec<i64>,
        ratings: Vec<RatingDto>,
        lists: Vec<(i64, String, Vec<i64>)>,
        next_list_id: i64,
        fail_watchlist_fetch: bool,
        fail_mutations: bool,
    }

    struct MockApi {
        state: Mutex<MockState>,
    }

    impl MockApi {
        fn new(state: MockState) -> Self {
            Self {
                state: Mutex::new(state),
            }
        }

        fn fail() -> ClientError {
            ClientError::Api {
                status: 500,
                message: "boom".to_string(),
            }
        }
    }

    #[async_trait]
    impl UserLibraryApi for MockApi {
        async fn fetch_favorites(&self) -> Result<Vec<i64>, ClientError> {
            Ok(self.state.lock().unwrap().favorites.clone())
        }

        async fn fetch_watchlist(&self) -> Result<Vec<i64>, ClientError> {
            let state = self.state.lock().unwrap();
            if state.fail_watchlist_fetch {
                return Err(Self::fail());
            }
            Ok(state.watchlist.clone())
        }

        async fn fetch_ratings(&self) -> Result<Vec<RatingDto>, ClientError> {
            Ok(self.state.lock().unwrap().ratings.clone())
        }

        async fn fetch_lists(&self) -> Result<Vec<ListSummaryDto>, ClientError> {
            Ok(self
                .state
                .lock()
                .unwrap()
                .lists
                .iter()
                .map(|(id, name, movies)| ListSummaryDto {
                    id: *id,
                    name: name.clone(),
                    item_count: movies.len() as i64,
                })
                .collect())
        }

        async fn fetch_list_details(&self, list_id: i64) -> Result<ListDetailsDto, ClientError> {
            let state = self.state.lock().unwrap();
            state
                .lists
                .iter()
                .find(|(id, _, _)| *id == list_id)
                .map(|(id, name, movies)| ListDetailsDto {
                    id: *id,
                    name: name.clone(),
                    movie_ids: movies.clone(),
                })
                .ok_or(ClientError::Api {
                    status: 404,
                    message: "List not found".to_string(),
                })
        }

        async fn add_favorite(&self, movie_id: i64) -> Result<(), ClientError> {
            let mut state = self.state.lock().unwrap();
            if state.fail_mutations {
                return Err(Self::fail());
            }
            state.favorites.push(movie_id);
            Ok(())
        }

        async fn remove_favorite(&self, movie_id: i64) -> Result<(), ClientError> {
            let mut state = self.state.lock().unwrap();
            if state.fail_mutations {
                return Err(Self::fail());
            }
            state.favorites.retain(|id| *id != movie_id);
            Ok(())
        }

        async fn add_watchlist(&self, movie_id: i64) -> Result<(), ClientError> {
            self.state.lock().unwrap().watchlist.push(movie_id);
            Ok(())
        }

        async fn remove_watchlist(&self, movie_id: i64) -> Result<(), ClientError> {
            self.state
                .lock()
                .unwrap()
                .watchlist
                .retain(|id| *id != movie_id);
            Ok(())
        }

        async fn rate(&self, movie_id: i64, value: f64) -> Result<(), ClientError> {
            let mut state = self.state.lock().unwrap();
            if state.fail_mutations {
                return Err(Self::fail());
            }
            state.ratings.retain(|r| r.movie_id != movie_id);
            state.ratings.push(RatingDto {
                movie_id,
                rating: value,
            });
            Ok(())
        }

        async fn unrate(&self, movie_id: i64) -> Result<(), ClientError> {
            self.state
                .lock()
                .unwrap()
                .ratings
                .retain(|r| r.movie_id != movie_id);
            Ok(())
        }

        async fn create_list(&self, name: &str) -> Result<CreatedListDto, ClientError> {
            let mut state = self.state.lock().unwrap();
            state.next_list_id += 1;
            let id = state.next_list_id;
            state.lists.push((id, name.to_string(), Vec::new()));
            Ok(CreatedListDto {
                id,
                name: name.to_string(),
            })
        }

        async fn delete_list(&self, list_id: i64) -> Result<(), ClientError> {
            self.state
                .lock()
                .unwrap()
                .lists
                .retain(|(id, _, _)| *id != list_id);
            Ok(())
        }

        async fn add_movie_to_list(&self, list_id: i64, movie_id: i64) -> Result<(), ClientError> {
            let mut state = self.state.lock().unwrap();
            let list = state
                .lists
                .iter_mut()
                .find(|(id, _, _)| *id == list_id)
                .ok_or(ClientError::Api {
                    status: 403,
                    message: "List not found or unauthorized".to_string(),
                })?;
            if !list.2.contains(&movie_id) {
                list.2.push(movie_id);
            }
            Ok(())
        }

        async fn remove_movie_from_list(
            &self,
            list_id: i64,
            movie_id: i64,
        ) -> Result<(), ClientError> {
            let mut state = self.state.lock().unwrap();
            if let Some(list) = state.lists.iter_mut().find(|(id, _, _)| *id == list_id) {
                list.2.retain(|id| *id != movie_id);
            }
            Ok(())
        }
    }

    fn cache_with(state: MockState) -> LibraryCache<MockApi> {
        LibraryCache::new(MockApi::new(state))
    }

    #[tokio::test]
    async fn hydrate_populates_all_collections() {
        let mut cache = cache_with(MockState {
            favorites: vec![5, 9],
            watchlist: vec![9],
            ratings: vec![RatingDto {
                movie_id: 5,
                rating: 7.5,
            }],
            lists: vec![(1, "Noir".to_string(), vec![5])],
            next_list_id: 1,
            ..Default::default()
        });
        cache.hydrate().await;

        assert!(cache.is_favorite(5));
        assert!(cache.in_watchlist(9));
        assert_eq!(cache.rating_for(5), Some(7.5));
        assert_eq!(cache.lists()[&1].item_count, 1);
        assert!(cache.list_members(1).unwrap().contains(&5));
    }

    #[tokio::test]
    async fn hydrate_tolerates_one_failing_fetch() {
        let mut cache = cache_with(MockState {
            favorites: vec![1, 2],
            watchlist: vec![3],
            ratings: vec![RatingDto {
                movie_id: 1,
                rating: 8.0,
            }],
            lists: vec![(1, "Noir".to_string(), vec![])],
            next_list_id: 1,
            fail_watchlist_fetch: true,
            ..Default::default()
        });
        cache.hydrate().await;

        // Watchlist stays empty; the other three still populate.
        assert!(cache.watchlist().is_empty());
        assert!(cache.is_favorite(1));
        assert_eq!(cache.rating_for(1), Some(8.0));
        assert_eq!(cache.lists().len(), 1);
    }

    #[tokio::test]
    async fn favorite_round_trip_restores_prior_state() {
        let mut cache = cache_with(MockState::default());
        cache.hydrate().await;

        assert!(!cache.is_favorite(42));
        cache.add_favorite(42).await.unwrap();
        assert!(cache.is_favorite(42));
        cache.remove_favorite(42).await.unwrap();
        assert!(!cache.is_favorite(42));
    }

    #[tokio::test]
    async fn failed_mutation_leaves_cache_untouched() {
        let mut cache = cache_with(MockState {
            fail_mutations: true,
            ..Default::default()
        });

        assert!(cache.add_favorite(7).await.is_err());
        assert!(!cache.is_favorite(7));

        assert!(cache.rate(7, 8.0).await.is_err());
        assert_eq!(cache.rating_for(7), None);
    }

    #[tokio::test]
    async fn rating_validated_before_sending() {
        let mut cache = cache_with(MockState::default());

        let err = cache.rate(7, 0.3).await.unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
        let err = cache.rate(7, 10.5).await.unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));

        cache.rate(7, 7.5).await.unwrap();
        assert_eq!(cache.rating_for(7), Some(7.5));
        cache.unrate(7).await.unwrap();
        assert_eq!(cache.rating_for(7), None);
    }

    #[tokio::test]
    async fn list_count_tracks_membership_cardinality() {
        let mut cache = cache_with(MockState::default());

        let list_id = cache.create_list("Heists").await.unwrap();
        assert_eq!(cache.lists()[&list_id].item_count, 0);

        cache.add_movie_to_list(list_id, 1).await.unwrap();
        cache.add_movie_to_list(list_id, 2).await.unwrap();
        // Duplicate add is a set no-op.
        cache.add_movie_to_list(list_id, 2).await.unwrap();
        assert_eq!(cache.lists()[&list_id].item_count, 2);
        assert_eq!(cache.list_members(list_id).unwrap().len(), 2);

        // Removing a non-member leaves the count unchanged.
        cache.remove_movie_from_list(list_id, 99).await.unwrap();
        assert_eq!(cache.lists()[&list_id].item_count, 2);

        cache.remove_movie_from_list(list_id, 1).await.unwrap();
        assert_eq!(cache.lists()[&list_id].item_count, 1);
        assert_eq!(
            cache.lists()[&list_id].item_count,
            cache.list_members(list_id).unwrap().len()
        );
    }

    #[tokio::test]
    async fn delete_list_drops_membership_set() {
        let mut cache = cache_with(MockState::default());

        let list_id = cache.create_list("Gone").await.unwrap();
        cache.add_movie_to_list(list_id, 5).await.unwrap();
        cache.delete_list(list_id).await.unwrap();

        assert!(cache.lists().get(&list_id).is_none());
        assert!(cache.list_members(list_id).is_none());
    }
}
