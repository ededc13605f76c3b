use std::collections::{HashMap, HashSet};

use crate::tmdb::Movie;

const POSTER_CDN_BASE: &str = "https://image.tmdb.org/t/p/w500";
const NOT_AVAILABLE: &str = "N/A";

/// Display-ready record for one catalog movie merged with the user's
/// library state.
#[derive(Debug, Clone, PartialEq)]
pub struct MovieCard {
    pub id: i64,
    pub poster_url: String,
    pub title: String,
    pub score: String,
    pub original_language: String,
    pub release_year: String,
    pub is_favorite: bool,
    pub is_watchlist: bool,
    pub rating: f64,
}

pub fn poster_url(poster_path: Option<&str>, fallback: &str) -> String {
    match poster_path {
        Some(path) if !path.is_empty() => format!("{}{}", POSTER_CDN_BASE, path),
        _ => fallback.to_string(),
    }
}

pub fn format_score(score: Option<f64>) -> String {
    match score {
        Some(v) if v.is_finite() => format!("{:.1}", v),
        _ => NOT_AVAILABLE.to_string(),
    }
}

pub fn release_year(release_date: Option<&str>) -> String {
    release_date
        .and_then(|d| d.split('-').next())
        .and_then(|y| y.parse::<i32>().ok())
        .map(|y| y.to_string())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// Pure function: the same movies and the same library state always yield
/// the same cards. All per-item display decisions live here.
pub fn project_movies(
    movies: &[Movie],
    favorites: &HashSet<i64>,
    watchlist: &HashSet<i64>,
    ratings: &HashMap<i64, f64>,
    fallback_poster: &str,
) -> Vec<MovieCard> {
    movies
        .iter()
        .map(|movie| MovieCard {
            id: movie.id,
            poster_url: poster_url(movie.poster_path.as_deref(), fallback_poster),
            title: movie
                .title
                .clone()
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            score: format_score(movie.vote_average),
            original_language: movie
                .original_language
                .clone()
                .filter(|l| !l.is_empty())
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            release_year: release_year(movie.release_date.as_deref()),
            is_favorite: favorites.contains(&movie.id),
            is_watchlist: watchlist.contains(&movie.id),
            rating: ratings.get(&movie.id).copied().unwrap_or(0.0),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movie(id: i64) -> Movie {
        Movie {
            id,
            title: Some(format!("Movie {}", id)),
            poster_path: Some(format!("/poster{}.jpg", id)),
            release_date: Some("2021-05-01".to_string()),
            vote_average: Some(7.25),
            original_language: Some("en".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn merges_library_state_per_item() {
        let favorites: HashSet<i64> = [5].into_iter().collect();
        let watchlist: HashSet<i64> = HashSet::new();
        let ratings: HashMap<i64, f64> = [(5, 7.5)].into_iter().collect();

        let cards = project_movies(
            &[movie(5), movie(9)],
            &favorites,
            &watchlist,
            &ratings,
            "/fallback.png",
        );

        assert!(cards[0].is_favorite);
        assert!(!cards[0].is_watchlist);
        assert_eq!(cards[0].rating, 7.5);

        assert!(!cards[1].is_favorite);
        assert!(!cards[1].is_watchlist);
        assert_eq!(cards[1].rating, 0.0);
    }

    #[test]
    fn missing_fields_fall_back_to_na() {
        let sparse = Movie {
            id: 1,
            ..Default::default()
        };
        let cards = project_movies(
            &[sparse],
            &HashSet::new(),
            &HashSet::new(),
            &HashMap::new(),
            "/fallback.png",
        );

        let card = &cards[0];
        assert_eq!(card.poster_url, "/fallback.png");
        assert_eq!(card.title, "N/A");
        assert_eq!(card.score, "N/A");
        assert_eq!(card.original_language, "N/A");
        assert_eq!(card.release_year, "N/A");
    }

    #[test]
    fn formats_score_to_one_decimal() {
        assert_eq!(format_score(Some(7.123)), "7.1");
        assert_eq!(format_score(Some(8.0)), "8.0");
        assert_eq!(format_score(Some(f64::NAN)), "N/A");
        assert_eq!(format_score(None), "N/A");
    }

    #[test]
    fn extracts_year_from_release_date() {
        assert_eq!(release_year(Some("1999-03-31")), "1999");
        assert_eq!(release_year(Some("")), "N/A");
        assert_eq!(release_year(Some("soon")), "N/A");
        assert_eq!(release_year(None), "N/A");
    }

    #[test]
    fn resolves_poster_through_cdn() {
        assert_eq!(
            poster_url(Some("/abc.jpg"), "/fallback.png"),
            "https://image.tmdb.org/t/p/w500/abc.jpg"
        );
        assert_eq!(poster_url(None, "/fallback.png"), "/fallback.png");
    }
}
