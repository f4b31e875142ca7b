use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path, State},
    http::StatusCode,
};
use serde::Deserialize;

use crate::{
    AppState, auth::Claims, errors::AppError, storage::models::Worker, workers::WorkerService,
};

#[derive(Debug, Deserialize)]
pub struct CreateWorkerRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub phone: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateWorkerRequest {
    #[serde(default)]
    pub phone: String,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

/// POST /api/workers
pub async fn create_worker_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<Arc<Claims>>,
    Json(req): Json<CreateWorkerRequest>,
) -> Result<(StatusCode, Json<Worker>), AppError> {
    claims.require_admin()?;
    let worker = WorkerService::create(&state, &req.username, &req.password, &req.phone).await?;
    Ok((StatusCode::CREATED, Json(worker)))
}

/// GET /api/workers
pub async fn list_workers_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<Arc<Claims>>,
) -> Result<Json<Vec<Worker>>, AppError> {
    claims.require_admin()?;
    Ok(Json(WorkerService::list(&state).await?))
}

/// GET /api/workers/{id}
pub async fn get_worker_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<Arc<Claims>>,
    Path(id): Path<i64>,
) -> Result<Json<Worker>, AppError> {
    claims.require_admin()?;
    Ok(Json(WorkerService::get(&state, id).await?))
}

/// PUT /api/workers/{id}
pub async fn update_worker_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<Arc<Claims>>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateWorkerRequest>,
) -> Result<Json<Worker>, AppError> {
    claims.require_admin()?;
    Ok(Json(
        WorkerService::update(&state, id, &req.phone, req.active).await?,
    ))
}

/// DELETE /api/workers/{id}
pub async fn delete_worker_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<Arc<Claims>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    claims.require_admin()?;
    WorkerService::delete(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
