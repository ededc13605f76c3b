use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};
use tracing::error;

use crate::db::DbError;
use crate::tmdb::TmdbError;

/// Error taxonomy for the REST surface. Every variant renders as the
/// standard `{ message, status, details, timestamp }` body.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{message}")]
    Validation {
        message: String,
        details: Option<Value>,
    },
    #[error("Unauthorized: No valid session found")]
    Unauthorized,
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{message}")]
    Upstream { status: u16, message: String },
    #[error("Internal Server Error")]
    Internal(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation {
            message: message.into(),
            details: None,
        }
    }

    /// Field-level validation failure: names the field and the constraint
    /// it violated.
    pub fn invalid_field(field: &str, constraint: &str) -> Self {
        ApiError::Validation {
            message: "Validation Error".to_string(),
            details: Some(json!([{ "field": field, "constraint": constraint }])),
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation { .. } => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Upstream { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_REQUEST)
            }
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Internal failures are logged server-side and never leak detail.
        if let ApiError::Internal(ref detail) = self {
            error!("Internal error: {}", detail);
        }

        let status = self.status();
        let details = match &self {
            ApiError::Validation { details, .. } => details.clone().unwrap_or(Value::Null),
            _ => Value::Null,
        };

        let body = json!({
            "message": self.to_string(),
            "status": status.as_u16(),
            "details": details,
            "timestamp": Utc::now().to_rfc3339(),
        });

        (status, Json(body)).into_response()
    }
}

impl From<DbError> for ApiError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::NotFound(msg) => ApiError::NotFound(msg),
            DbError::AlreadyExists(msg) => ApiError::validation(msg),
            DbError::Sqlx(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<TmdbError> for ApiError {
    fn from(e: TmdbError) -> Self {
        match e {
            TmdbError::Upstream { status, message } => ApiError::Upstream { status, message },
            TmdbError::Http(e) => ApiError::Upstream {
                status: 400,
                message: format!("Catalog API unreachable: {}", e),
            },
            TmdbError::NoAccount => {
                ApiError::Internal("TMDB account id is not configured".to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn error_body_shape() {
        let response = ApiError::invalid_field("rating", "must be a multiple of 0.5 in [0.5, 10]")
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["message"], "Validation Error");
        assert_eq!(body["status"], 400);
        assert_eq!(body["details"][0]["field"], "rating");
        assert_eq!(
            body["details"][0]["constraint"],
            "must be a multiple of 0.5 in [0.5, 10]"
        );
        assert!(body["timestamp"].is_string());
    }

    #[test]
    fn upstream_status_passes_through() {
        let err = ApiError::from(TmdbError::Upstream {
            status: 404,
            message: "The resource you requested could not be found.".to_string(),
        });
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn db_not_found_maps_to_404() {
        let err = ApiError::from(DbError::NotFound("List not found: 3".to_string()));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }
}
