use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path, Query, State},
    http::StatusCode,
};

use crate::{
    AppState,
    auth::Claims,
    clients::ClientService,
    errors::AppError,
    storage::models::{Client, ClientInput, ClientQuery},
};

/// GET /api/clients
pub async fn list_clients_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<Arc<Claims>>,
    Query(query): Query<ClientQuery>,
) -> Result<Json<Vec<Client>>, AppError> {
    claims.require_admin()?;
    Ok(Json(ClientService::list(&state, &query).await?))
}

/// GET /api/clients/{id}
pub async fn get_client_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<Arc<Claims>>,
    Path(id): Path<i64>,
) -> Result<Json<Client>, AppError> {
    claims.require_admin()?;
    Ok(Json(ClientService::get(&state, id).await?))
}

/// POST /api/clients
pub async fn create_client_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<Arc<Claims>>,
    Json(input): Json<ClientInput>,
) -> Result<(StatusCode, Json<Client>), AppError> {
    claims.require_admin()?;
    let client = ClientService::create(&state, &input).await?;
    Ok((StatusCode::CREATED, Json(client)))
}

/// PUT /api/clients/{id}
pub async fn update_client_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<Arc<Claims>>,
    Path(id): Path<i64>,
    Json(input): Json<ClientInput>,
) -> Result<Json<Client>, AppError> {
    claims.require_admin()?;
    Ok(Json(ClientService::update(&state, id, &input).await?))
}

/// DELETE /api/clients/{id}
pub async fn delete_client_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<Arc<Claims>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    claims.require_admin()?;
    ClientService::delete(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
