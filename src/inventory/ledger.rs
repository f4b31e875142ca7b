use tracing::info;

use crate::{
    AppState,
    auth::Claims,
    errors::AppError,
    maintenance::MaintenanceService,
    storage::models::{Expense, ExpenseQuery, MAX_QUANTITY, SupplyUsage},
};

/// Supply consumption on visits. Each stock movement is booked as an expense
/// priced at the supply's cost when it was used.
pub struct LedgerService;

fn check_quantity(quantity: i64) -> Result<(), AppError> {
    if quantity <= 0 {
        return Err(AppError::BadRequest(
            "Quantity must be greater than zero".to_string(),
        ));
    }
    if quantity > MAX_QUANTITY {
        return Err(AppError::BadRequest("Quantity is out of range".to_string()));
    }
    Ok(())
}

impl LedgerService {
    async fn usage(state: &AppState, id: i64) -> Result<SupplyUsage, AppError> {
        state
            .storage
            .ledger
            .get_usage(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Usage not found".to_string()))
    }

    pub async fn record_usage(
        state: &AppState,
        claims: &Claims,
        maintenance_id: i64,
        supply_id: i64,
        quantity: i64,
    ) -> Result<SupplyUsage, AppError> {
        check_quantity(quantity)?;
        let maintenance = MaintenanceService::get(state, maintenance_id).await?;
        MaintenanceService::authorize(state, claims, &maintenance).await?;

        let usage = state
            .storage
            .ledger
            .record_usage(maintenance_id, supply_id, quantity, state.settings.today())
            .await?;
        info!(
            "Recorded {} of supply {} on maintenance {}",
            quantity, supply_id, maintenance_id
        );
        Ok(usage)
    }

    pub async fn update_usage(
        state: &AppState,
        claims: &Claims,
        id: i64,
        quantity: i64,
    ) -> Result<SupplyUsage, AppError> {
        check_quantity(quantity)?;
        let usage = Self::usage(state, id).await?;
        let maintenance = MaintenanceService::get(state, usage.maintenance_id).await?;
        MaintenanceService::authorize(state, claims, &maintenance).await?;

        state.storage.ledger.update_usage(id, quantity).await
    }

    pub async fn delete_usage(state: &AppState, claims: &Claims, id: i64) -> Result<(), AppError> {
        let usage = Self::usage(state, id).await?;
        let maintenance = MaintenanceService::get(state, usage.maintenance_id).await?;
        MaintenanceService::authorize(state, claims, &maintenance).await?;

        if !state.storage.ledger.delete_usage(id).await? {
            return Err(AppError::NotFound("Usage not found".to_string()));
        }
        Ok(())
    }

    pub async fn list_expenses(
        state: &AppState,
        query: &ExpenseQuery,
    ) -> Result<Vec<Expense>, AppError> {
        state.storage.ledger.list_expenses(query).await
    }

    pub async fn delete_expense(state: &AppState, id: i64) -> Result<(), AppError> {
        if !state.storage.ledger.delete_expense(id).await? {
            return Err(AppError::NotFound("Expense not found".to_string()));
        }
        Ok(())
    }
}
