use axum::{
    async_trait,
    extract::{FromRequestParts, State},
    http::{header, request::Parts, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::{Duration, Utc};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use super::error::{ApiError, ApiResult};
use crate::db::{Session, SessionRepo, User, UserRepo};
use crate::middleware::{session_token_from_headers, SESSION_COOKIE};
use crate::server::AppState;

const SESSION_TTL_DAYS: i64 = 7;
const MIN_PASSWORD_LEN: usize = 8;

/// The authenticated user, resolved from the session cookie by the
/// middleware. Extracting it from an unauthenticated request yields 401.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or(ApiError::Unauthorized)
    }
}

#[derive(Debug, Deserialize)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

fn session_cookie(token: &str, max_age_secs: i64) -> String {
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE, token, max_age_secs
    )
}

async fn issue_session(state: &AppState, user_id: &str) -> ApiResult<Session> {
    let session = Session {
        token: uuid::Uuid::new_v4().to_string(),
        userid: user_id.to_string(),
        created: Some(Utc::now()),
        expires: Utc::now() + Duration::days(SESSION_TTL_DAYS),
    };
    state.db.create_session(&session).await?;
    Ok(session)
}

pub async fn sign_up(
    State(state): State<AppState>,
    Json(req): Json<SignUpRequest>,
) -> ApiResult<impl IntoResponse> {
    let email = req.email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(ApiError::invalid_field("email", "must be a valid email address"));
    }
    if req.password.len() < MIN_PASSWORD_LEN {
        return Err(ApiError::invalid_field(
            "password",
            "must be at least 8 characters",
        ));
    }

    let hash = bcrypt::hash(&req.password, bcrypt::DEFAULT_COST)
        .map_err(|e| ApiError::Internal(format!("Password hashing failed: {}", e)))?;

    let user = User {
        id: uuid::Uuid::new_v4().to_string(),
        email,
        name: req.name.trim().to_string(),
        password: hash,
        created: Some(Utc::now()),
    };
    state.db.create_user(&user).await?;

    info!(user = %user.id, "New user registered");

    let session = issue_session(&state, &user.id).await?;
    Ok((
        StatusCode::CREATED,
        [(
            header::SET_COOKIE,
            session_cookie(&session.token, SESSION_TTL_DAYS * 86400),
        )],
        Json(json!({ "user": user })),
    ))
}

pub async fn sign_in(
    State(state): State<AppState>,
    Json(req): Json<SignInRequest>,
) -> ApiResult<impl IntoResponse> {
    let email = req.email.trim().to_lowercase();

    let user = match state.db.get_user_by_email(&email).await {
        Ok(user) => user,
        Err(_) => return Err(ApiError::Unauthorized),
    };

    let valid = bcrypt::verify(&req.password, &user.password)
        .map_err(|e| ApiError::Internal(format!("Password verification failed: {}", e)))?;
    if !valid {
        return Err(ApiError::Unauthorized);
    }

    let session = issue_session(&state, &user.id).await?;
    Ok((
        [(
            header::SET_COOKIE,
            session_cookie(&session.token, SESSION_TTL_DAYS * 86400),
        )],
        Json(json!({ "user": user })),
    ))
}

pub async fn sign_out(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<impl IntoResponse> {
    if let Some(token) = session_token_from_headers(&headers) {
        state.db.delete_session(&token).await?;
    }

    Ok((
        StatusCode::NO_CONTENT,
        [(header::SET_COOKIE, session_cookie("", 0))],
    ))
}

pub async fn me(user: CurrentUser) -> Json<serde_json::Value> {
    Json(json!({ "user": user.0 }))
}
