use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path, Query, State},
    http::StatusCode,
};

use crate::{
    AppState,
    auth::Claims,
    errors::AppError,
    finance::{FinanceService, FinanceSummary},
    inventory::LedgerService,
    storage::models::{
        DateRange, Expense, ExpenseQuery, Income, IncomeInput, RecurringInput, RecurringMovement,
    },
};

/// GET /api/incomes
pub async fn list_incomes_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<Arc<Claims>>,
    Query(range): Query<DateRange>,
) -> Result<Json<Vec<Income>>, AppError> {
    claims.require_admin()?;
    Ok(Json(FinanceService::list_incomes(&state, &range).await?))
}

/// GET /api/incomes/{id}
pub async fn get_income_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<Arc<Claims>>,
    Path(id): Path<i64>,
) -> Result<Json<Income>, AppError> {
    claims.require_admin()?;
    Ok(Json(FinanceService::get_income(&state, id).await?))
}

/// POST /api/incomes
pub async fn create_income_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<Arc<Claims>>,
    Json(input): Json<IncomeInput>,
) -> Result<(StatusCode, Json<Income>), AppError> {
    claims.require_admin()?;
    let income = FinanceService::create_income(&state, &input).await?;
    Ok((StatusCode::CREATED, Json(income)))
}

/// PUT /api/incomes/{id}
pub async fn update_income_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<Arc<Claims>>,
    Path(id): Path<i64>,
    Json(input): Json<IncomeInput>,
) -> Result<Json<Income>, AppError> {
    claims.require_admin()?;
    Ok(Json(FinanceService::update_income(&state, id, &input).await?))
}

/// DELETE /api/incomes/{id}
pub async fn delete_income_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<Arc<Claims>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    claims.require_admin()?;
    FinanceService::delete_income(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/expenses
pub async fn list_expenses_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<Arc<Claims>>,
    Query(query): Query<ExpenseQuery>,
) -> Result<Json<Vec<Expense>>, AppError> {
    claims.require_admin()?;
    Ok(Json(LedgerService::list_expenses(&state, &query).await?))
}

/// GET /api/recurring
pub async fn list_recurring_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<Arc<Claims>>,
) -> Result<Json<Vec<RecurringMovement>>, AppError> {
    claims.require_admin()?;
    Ok(Json(FinanceService::list_recurring(&state).await?))
}

/// GET /api/recurring/{id}
pub async fn get_recurring_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<Arc<Claims>>,
    Path(id): Path<i64>,
) -> Result<Json<RecurringMovement>, AppError> {
    claims.require_admin()?;
    Ok(Json(FinanceService::get_recurring(&state, id).await?))
}

/// POST /api/recurring
pub async fn create_recurring_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<Arc<Claims>>,
    Json(input): Json<RecurringInput>,
) -> Result<(StatusCode, Json<RecurringMovement>), AppError> {
    claims.require_admin()?;
    let movement = FinanceService::create_recurring(&state, &input).await?;
    Ok((StatusCode::CREATED, Json(movement)))
}

/// PUT /api/recurring/{id}
pub async fn update_recurring_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<Arc<Claims>>,
    Path(id): Path<i64>,
    Json(input): Json<RecurringInput>,
) -> Result<Json<RecurringMovement>, AppError> {
    claims.require_admin()?;
    Ok(Json(
        FinanceService::update_recurring(&state, id, &input).await?,
    ))
}

/// DELETE /api/recurring/{id}
pub async fn delete_recurring_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<Arc<Claims>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    claims.require_admin()?;
    FinanceService::delete_recurring(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/finance/summary
pub async fn summary_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<Arc<Claims>>,
    Query(range): Query<DateRange>,
) -> Result<Json<FinanceSummary>, AppError> {
    claims.require_admin()?;
    Ok(Json(
        FinanceService::summary(&state, range.from, range.to).await?,
    ))
}
