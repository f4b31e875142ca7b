use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Query, State},
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
    AppState,
    auth::Claims,
    dashboard::{
        DashboardService, OperationsBoard,
        service::Dashboard,
    },
    errors::AppError,
};

#[derive(Debug, Default, Deserialize)]
pub struct OperationsQuery {
    pub mode: Option<String>,
    pub date: Option<String>,
}

/// GET /dashboard/home
pub async fn home_handler(
    Extension(claims): Extension<Arc<Claims>>,
) -> Result<Json<Value>, AppError> {
    let view = DashboardService::view(&claims)?;
    Ok(Json(json!({ "view": view })))
}

/// GET /dashboard
pub async fn dashboard_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<Arc<Claims>>,
) -> Result<Json<Dashboard>, AppError> {
    Ok(Json(DashboardService::dashboard(&state, &claims).await?))
}

/// GET /dashboard/operations
pub async fn operations_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<Arc<Claims>>,
    Query(query): Query<OperationsQuery>,
) -> Result<Json<OperationsBoard>, AppError> {
    claims.require_admin()?;
    let board =
        DashboardService::operations(&state, query.mode.as_deref(), query.date.as_deref()).await?;
    Ok(Json(board))
}

/// GET /dashboard/offline
pub async fn offline_handler(
    Extension(claims): Extension<Arc<Claims>>,
) -> Result<Json<Value>, AppError> {
    let view = DashboardService::view(&claims)?;
    Ok(Json(json!({ "view": view, "offline": true })))
}
