use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
};
use axum_extra::{TypedHeader, headers::UserAgent};
use tracing::info;
use uuid::Uuid;

use crate::{
    AppState,
    auth::{
        Claims,
        local::hash_password,
        types::{
            CreateUserRequest, LoginRequest, LoginResponse, LogoutRequest, MeResponse,
            RefreshRequest, RefreshResponse,
        },
    },
    errors::AppError,
    storage::models::{NewUser, StoredUser},
};

fn agent(user_agent: Option<TypedHeader<UserAgent>>) -> String {
    user_agent
        .map(|TypedHeader(ua)| ua.as_str().to_string())
        .unwrap_or_default()
}

pub async fn login_handler(
    State(state): State<AppState>,
    user_agent: Option<TypedHeader<UserAgent>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let response = state
        .sessions
        .login(&req.username, &req.password, &agent(user_agent))
        .await?;
    Ok(Json(response))
}

pub async fn refresh_handler(
    State(state): State<AppState>,
    user_agent: Option<TypedHeader<UserAgent>>,
    Json(req): Json<RefreshRequest>,
) -> Result<Json<RefreshResponse>, AppError> {
    info!("refresh token request received");
    let response = state
        .sessions
        .refresh_token(&req.refresh_token, &agent(user_agent))
        .await?;
    Ok(Json(response))
}

pub async fn logout_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<Arc<Claims>>,
    Json(req): Json<LogoutRequest>,
) -> Result<StatusCode, AppError> {
    state.sessions.logout(&req.refresh_token, &claims.sub).await?;
    Ok(StatusCode::OK)
}

pub async fn me_handler(Extension(claims): Extension<Arc<Claims>>) -> Json<MeResponse> {
    Json(MeResponse {
        uid: claims.sub.clone(),
        username: claims.username.clone(),
        roles: claims.roles.clone(),
    })
}

/// POST /api/users
pub async fn create_user_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<Arc<Claims>>,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<StoredUser>), AppError> {
    claims.require_admin()?;
    if req.username.trim().is_empty() || req.password.is_empty() {
        return Err(AppError::BadRequest(
            "Username and password are required".to_string(),
        ));
    }

    let user = state
        .storage
        .users
        .create_user(&NewUser {
            uid: Uuid::new_v4().to_string(),
            username: req.username.trim().to_string(),
            email: req.email,
            password_hash: hash_password(&req.password)?,
            is_superuser: false,
            groups: req.groups,
        })
        .await?;
    info!("User {} created by {}", user.username, claims.username);
    Ok((StatusCode::CREATED, Json(user)))
}

/// GET /api/users
pub async fn list_users_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<Arc<Claims>>,
) -> Result<Json<Vec<StoredUser>>, AppError> {
    claims.require_admin()?;
    Ok(Json(state.storage.users.list_users().await?))
}
