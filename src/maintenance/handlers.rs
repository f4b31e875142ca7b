use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use time::Date;

use crate::{
    AppState,
    auth::Claims,
    errors::AppError,
    maintenance::{MaintenanceChanges, MaintenanceDetail, MaintenanceService},
    storage::models::{ChecklistItem, Maintenance, MaintenanceQuery, MaintenanceStatus},
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMaintenanceRequest {
    pub contract_id: i64,
    #[serde(default)]
    pub client_id: Option<i64>,
    pub date: Date,
    #[serde(default)]
    pub worker_ids: Vec<i64>,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMaintenanceRequest {
    pub date: Option<Date>,
    pub worker_ids: Option<Vec<i64>>,
    pub status: Option<MaintenanceStatus>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListMaintenancesQuery {
    pub date: Option<Date>,
    pub from: Option<Date>,
    pub to: Option<Date>,
    pub status: Option<MaintenanceStatus>,
    pub worker_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ChecklistItemRequest {
    pub description: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChecklistPatchRequest {
    pub done: Option<bool>,
    pub notes: Option<String>,
}

/// POST /api/maintenances
pub async fn create_maintenance_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<Arc<Claims>>,
    Json(req): Json<CreateMaintenanceRequest>,
) -> Result<(StatusCode, Json<Maintenance>), AppError> {
    claims.require_admin()?;
    let maintenance = MaintenanceService::create(
        &state,
        req.contract_id,
        req.client_id,
        req.date,
        req.worker_ids,
        req.notes,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(maintenance)))
}

/// GET /api/maintenances
pub async fn list_maintenances_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<Arc<Claims>>,
    Query(query): Query<ListMaintenancesQuery>,
) -> Result<Json<Vec<Maintenance>>, AppError> {
    let query = MaintenanceQuery {
        on: query.date,
        from: query.from,
        to: query.to,
        status: query.status,
        worker_id: query.worker_id,
        ..MaintenanceQuery::default()
    };
    Ok(Json(MaintenanceService::list(&state, &claims, query).await?))
}

/// GET /api/maintenances/{id}
pub async fn get_maintenance_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<Arc<Claims>>,
    Path(id): Path<i64>,
) -> Result<Json<MaintenanceDetail>, AppError> {
    Ok(Json(MaintenanceService::detail(&state, &claims, id).await?))
}

/// PUT /api/maintenances/{id}
pub async fn update_maintenance_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<Arc<Claims>>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateMaintenanceRequest>,
) -> Result<Json<Maintenance>, AppError> {
    claims.require_admin()?;
    let changes = MaintenanceChanges {
        date: req.date,
        worker_ids: req.worker_ids,
        status: req.status,
        notes: req.notes,
    };
    Ok(Json(MaintenanceService::update(&state, id, changes).await?))
}

/// POST /api/maintenances/{id}/complete
pub async fn complete_maintenance_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<Arc<Claims>>,
    Path(id): Path<i64>,
) -> Result<Json<Maintenance>, AppError> {
    Ok(Json(MaintenanceService::complete(&state, &claims, id).await?))
}

/// DELETE /api/maintenances/{id}
pub async fn delete_maintenance_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<Arc<Claims>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    claims.require_admin()?;
    MaintenanceService::delete(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/maintenances/{id}/checklist
pub async fn add_checklist_item_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<Arc<Claims>>,
    Path(id): Path<i64>,
    Json(req): Json<ChecklistItemRequest>,
) -> Result<(StatusCode, Json<ChecklistItem>), AppError> {
    claims.require_admin()?;
    let item = MaintenanceService::add_checklist_item(&state, id, &req.description).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// PATCH /api/checklist/{item_id}
pub async fn update_checklist_item_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<Arc<Claims>>,
    Path(item_id): Path<i64>,
    Json(req): Json<ChecklistPatchRequest>,
) -> Result<Json<ChecklistItem>, AppError> {
    let item = MaintenanceService::update_checklist_item(
        &state,
        &claims,
        item_id,
        req.done,
        req.notes.as_deref(),
    )
    .await?;
    Ok(Json(item))
}
