use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use super::auth::CurrentUser;
use super::error::{ApiError, ApiResult};
use super::favorites::{check_movie_id, MovieIdBody};
use crate::db::{DbError, List, ListDetails, ListRepo, ListSummary};
use crate::server::AppState;
use crate::util::is_valid_list_name;

#[derive(Debug, Deserialize)]
pub struct CreateListBody {
    pub name: String,
}

/// Membership mutations on a list the user does not own report 403, not 404:
/// the list id was named explicitly, so hiding it buys nothing.
fn reject_foreign_list(e: DbError) -> ApiError {
    match e {
        DbError::NotFound(_) => ApiError::Forbidden("List not found or unauthorized".to_string()),
        other => other.into(),
    }
}

pub async fn list_lists(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ApiResult<Json<Vec<ListSummary>>> {
    let lists = state.db.list_lists(&user.0.id).await?;
    Ok(Json(lists))
}

pub async fn get_list(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(list_id): Path<i64>,
) -> ApiResult<Json<ListDetails>> {
    let list = state.db.get_list(&user.0.id, list_id).await?;
    Ok(Json(list))
}

pub async fn create_list(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(body): Json<CreateListBody>,
) -> ApiResult<(StatusCode, Json<List>)> {
    if !is_valid_list_name(&body.name) {
        return Err(ApiError::invalid_field("name", "must be 1-50 characters"));
    }
    let list = state.db.create_list(&user.0.id, body.name.trim()).await?;
    Ok((StatusCode::CREATED, Json(list)))
}

pub async fn delete_list(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(list_id): Path<i64>,
) -> ApiResult<StatusCode> {
    state.db.delete_list(&user.0.id, list_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_list_movie(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(list_id): Path<i64>,
    Json(body): Json<MovieIdBody>,
) -> ApiResult<StatusCode> {
    check_movie_id(body.movie_id)?;
    state
        .db
        .add_list_movie(&user.0.id, list_id, body.movie_id)
        .await
        .map_err(reject_foreign_list)?;
    Ok(StatusCode::CREATED)
}

pub async fn remove_list_movie(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((list_id, movie_id)): Path<(i64, i64)>,
) -> ApiResult<StatusCode> {
    check_movie_id(movie_id)?;
    state
        .db
        .remove_list_movie(&user.0.id, list_id, movie_id)
        .await
        .map_err(reject_foreign_list)?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;

    #[tokio::test]
    async fn foreign_list_maps_to_403_with_error_body() {
        let err = reject_foreign_list(DbError::NotFound("List not found: 3".to_string()));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["message"], "List not found or unauthorized");
        assert_eq!(body["status"], 403);
        assert!(body.get("details").is_some());
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn non_ownership_errors_keep_their_mapping() {
        let err = reject_foreign_list(DbError::AlreadyExists("duplicate".to_string()));
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }
}
