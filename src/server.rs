use axum::{
    http::{header, HeaderValue, Method, StatusCode},
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, services::ServeDir, trace::TraceLayer,
};

use crate::api;
use crate::config::Config;
use crate::db::SqliteRepository;
use crate::tmdb::CatalogClient;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: Arc<SqliteRepository>,
    pub catalog: Arc<CatalogClient>,
}

impl AppState {
    pub fn new(config: Config, db: Arc<SqliteRepository>, catalog: Arc<CatalogClient>) -> Self {
        Self {
            config: Arc::new(config),
            db,
            catalog,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/api/auth/sign-up", post(api::auth::sign_up))
        .route("/api/auth/sign-in", post(api::auth::sign_in))
        .route("/api/auth/sign-out", post(api::auth::sign_out))
        .route("/api/user/me", get(api::auth::me));

    let library_routes = Router::new()
        .route(
            "/api/favorites",
            get(api::favorites::list_favorites).post(api::favorites::add_favorite),
        )
        .route(
            "/api/favorites/:movie_id",
            delete(api::favorites::remove_favorite),
        )
        .route(
            "/api/favorites/check/:movie_id",
            get(api::favorites::check_favorite),
        )
        .route(
            "/api/watchlist",
            get(api::watchlist::list_watchlist).post(api::watchlist::add_watchlist),
        )
        .route(
            "/api/watchlist/:movie_id",
            delete(api::watchlist::remove_watchlist),
        )
        .route(
            "/api/watchlist/check/:movie_id",
            get(api::watchlist::check_watchlist),
        )
        .route(
            "/api/ratings",
            get(api::ratings::list_ratings).post(api::ratings::upsert_rating),
        )
        .route("/api/ratings/:movie_id", delete(api::ratings::delete_rating))
        .route(
            "/api/ratings/check/:movie_id",
            get(api::ratings::check_rating),
        )
        .route(
            "/api/lists",
            get(api::lists::list_lists).post(api::lists::create_list),
        )
        .route(
            "/api/lists/:id",
            get(api::lists::get_list).delete(api::lists::delete_list),
        )
        .route("/api/lists/:id/movies", post(api::lists::add_list_movie))
        .route(
            "/api/lists/:id/movies/:movie_id",
            delete(api::lists::remove_list_movie),
        );

    let catalog_routes = Router::new()
        .route("/api/tmdb/popular", get(api::catalog::popular))
        .route("/api/tmdb/search", get(api::catalog::search))
        .route("/api/tmdb/genre/:genre_id", get(api::catalog::by_genre))
        .route("/api/tmdb/movie/:movie_id", get(api::catalog::movie_details))
        .route("/api/tmdb/favorite", post(api::catalog::set_favorite))
        .route("/api/tmdb/watchlist", post(api::catalog::set_watchlist))
        .route("/api/tmdb/rating", post(api::catalog::rate_movie))
        .route(
            "/api/tmdb/rating/:movie_id",
            delete(api::catalog::delete_rating),
        )
        .route(
            "/api/tmdb/list/:list_id/movies",
            post(api::catalog::list_add_item).delete(api::catalog::list_remove_item),
        )
        .route(
            "/api/tmdb/account/favorites",
            get(api::catalog::account_favorites),
        )
        .route(
            "/api/tmdb/account/watchlist",
            get(api::catalog::account_watchlist),
        )
        .route("/api/tmdb/account/ratings", get(api::catalog::account_rated))
        .route("/api/tmdb/account/lists", get(api::catalog::account_lists))
        .route(
            "/api/tmdb/account/list/:list_id",
            get(api::catalog::account_list_details),
        );

    let trending_routes = Router::new()
        .route("/api/trending", get(api::trending::top_trending))
        .route("/api/trending/increment", post(api::trending::increment));

    let mut router = Router::new()
        .route("/api/health", get(health_handler))
        .route("/robots.txt", get(robots_txt_handler))
        .merge(auth_routes)
        .merge(library_routes)
        .merge(catalog_routes)
        .merge(trending_routes)
        .fallback(fallback_handler);

    if let Some(ref appdir) = state.config.appdir {
        router = router.fallback_service(ServeDir::new(appdir));
    }

    router
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            crate::middleware::resolve_session,
        ))
        .layer(axum::middleware::from_fn(crate::middleware::log_request))
        .layer(cors_layer(&state.config))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// Session cookies require a concrete allowed origin, never a wildcard.
fn cors_layer(config: &Config) -> CorsLayer {
    let mut cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true);

    if let Ok(origin) = config.cors.origin.parse::<HeaderValue>() {
        cors = cors.allow_origin(origin);
    }

    cors
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn robots_txt_handler() -> &'static str {
    "User-agent: *\nDisallow: /\n"
}

async fn fallback_handler() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "message": "Not Found",
            "status": 404,
            "details": serde_json::Value::Null,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        })),
    )
}
