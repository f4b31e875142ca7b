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
    contracts::ContractService,
    errors::AppError,
    storage::models::{ChecklistTemplate, Contract, ContractInput, ContractQuery},
};

#[derive(Debug, Deserialize)]
pub struct TemplateRequest {
    pub description: String,
}

/// GET /api/contracts
pub async fn list_contracts_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<Arc<Claims>>,
    Query(query): Query<ContractQuery>,
) -> Result<Json<Vec<Contract>>, AppError> {
    claims.require_admin()?;
    Ok(Json(ContractService::list(&state, &query).await?))
}

/// GET /api/contracts/{id}
pub async fn get_contract_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<Arc<Claims>>,
    Path(id): Path<i64>,
) -> Result<Json<Contract>, AppError> {
    claims.require_admin()?;
    Ok(Json(ContractService::get(&state, id).await?))
}

/// POST /api/contracts
pub async fn create_contract_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<Arc<Claims>>,
    Json(input): Json<ContractInput>,
) -> Result<(StatusCode, Json<Contract>), AppError> {
    claims.require_admin()?;
    let contract = ContractService::create(&state, &input).await?;
    Ok((StatusCode::CREATED, Json(contract)))
}

/// PUT /api/contracts/{id}
pub async fn update_contract_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<Arc<Claims>>,
    Path(id): Path<i64>,
    Json(input): Json<ContractInput>,
) -> Result<Json<Contract>, AppError> {
    claims.require_admin()?;
    Ok(Json(ContractService::update(&state, id, &input).await?))
}

/// DELETE /api/contracts/{id}
pub async fn delete_contract_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<Arc<Claims>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    claims.require_admin()?;
    ContractService::delete(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/contracts/{id}/checklist
pub async fn list_templates_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<Arc<Claims>>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<ChecklistTemplate>>, AppError> {
    claims.require_admin()?;
    Ok(Json(ContractService::templates(&state, id).await?))
}

/// POST /api/contracts/{id}/checklist
pub async fn add_template_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<Arc<Claims>>,
    Path(id): Path<i64>,
    Json(req): Json<TemplateRequest>,
) -> Result<(StatusCode, Json<ChecklistTemplate>), AppError> {
    claims.require_admin()?;
    let template = ContractService::add_template(&state, id, &req.description).await?;
    Ok((StatusCode::CREATED, Json(template)))
}

/// DELETE /api/checklist-templates/{id}
pub async fn delete_template_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<Arc<Claims>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    claims.require_admin()?;
    ContractService::delete_template(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
