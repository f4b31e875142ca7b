use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;

use crate::{
    AppState,
    auth::Claims,
    errors::AppError,
    inventory::{LedgerService, SupplyService},
    storage::models::{Supply, SupplyInput, SupplyUsage},
};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplyListQuery {
    #[serde(default)]
    pub low_stock: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordUsageRequest {
    pub supply_id: i64,
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUsageRequest {
    pub quantity: i64,
}

/// GET /api/supplies
pub async fn list_supplies_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<Arc<Claims>>,
    Query(query): Query<SupplyListQuery>,
) -> Result<Json<Vec<Supply>>, AppError> {
    claims.require_admin()?;
    Ok(Json(SupplyService::list(&state, query.low_stock).await?))
}

/// GET /api/supplies/{id}
pub async fn get_supply_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<Arc<Claims>>,
    Path(id): Path<i64>,
) -> Result<Json<Supply>, AppError> {
    claims.require_admin()?;
    Ok(Json(SupplyService::get(&state, id).await?))
}

/// POST /api/supplies
pub async fn create_supply_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<Arc<Claims>>,
    Json(input): Json<SupplyInput>,
) -> Result<(StatusCode, Json<Supply>), AppError> {
    claims.require_admin()?;
    let supply = SupplyService::create(&state, &input).await?;
    Ok((StatusCode::CREATED, Json(supply)))
}

/// PUT /api/supplies/{id}
pub async fn update_supply_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<Arc<Claims>>,
    Path(id): Path<i64>,
    Json(input): Json<SupplyInput>,
) -> Result<Json<Supply>, AppError> {
    claims.require_admin()?;
    Ok(Json(SupplyService::update(&state, id, &input).await?))
}

/// DELETE /api/supplies/{id}
pub async fn delete_supply_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<Arc<Claims>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    claims.require_admin()?;
    SupplyService::delete(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/maintenances/{id}/usages
pub async fn record_usage_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<Arc<Claims>>,
    Path(maintenance_id): Path<i64>,
    Json(req): Json<RecordUsageRequest>,
) -> Result<(StatusCode, Json<SupplyUsage>), AppError> {
    let usage =
        LedgerService::record_usage(&state, &claims, maintenance_id, req.supply_id, req.quantity)
            .await?;
    Ok((StatusCode::CREATED, Json(usage)))
}

/// PUT /api/usages/{id}
pub async fn update_usage_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<Arc<Claims>>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateUsageRequest>,
) -> Result<Json<SupplyUsage>, AppError> {
    Ok(Json(
        LedgerService::update_usage(&state, &claims, id, req.quantity).await?,
    ))
}

/// DELETE /api/usages/{id}
pub async fn delete_usage_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<Arc<Claims>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    LedgerService::delete_usage(&state, &claims, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/expenses/{id}
pub async fn delete_expense_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<Arc<Claims>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    claims.require_admin()?;
    LedgerService::delete_expense(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
