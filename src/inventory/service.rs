use crate::{
    AppState,
    errors::AppError,
    storage::models::{MAX_CENTS, MAX_QUANTITY, Supply, SupplyInput},
};

pub struct SupplyService;

fn validate(input: &SupplyInput) -> Result<(), AppError> {
    if input.name.trim().is_empty() {
        return Err(AppError::BadRequest("Supply name is required".to_string()));
    }
    if input.stock < 0 || input.min_stock < 0 || input.price_cents < 0 {
        return Err(AppError::BadRequest(
            "Stock, minimum stock and price cannot be negative".to_string(),
        ));
    }
    if input.stock > MAX_QUANTITY || input.min_stock > MAX_QUANTITY {
        return Err(AppError::BadRequest("Stock is out of range".to_string()));
    }
    if input.price_cents > MAX_CENTS {
        return Err(AppError::BadRequest("Price is out of range".to_string()));
    }
    Ok(())
}

impl SupplyService {
    pub async fn list(state: &AppState, low_stock_only: bool) -> Result<Vec<Supply>, AppError> {
        state.storage.supplies.list_supplies(low_stock_only).await
    }

    pub async fn get(state: &AppState, id: i64) -> Result<Supply, AppError> {
        state
            .storage
            .supplies
            .get_supply(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Supply not found".to_string()))
    }

    pub async fn create(state: &AppState, input: &SupplyInput) -> Result<Supply, AppError> {
        validate(input)?;
        state.storage.supplies.create_supply(input).await
    }

    pub async fn update(
        state: &AppState,
        id: i64,
        input: &SupplyInput,
    ) -> Result<Supply, AppError> {
        validate(input)?;
        state
            .storage
            .supplies
            .update_supply(id, input)
            .await?
            .ok_or_else(|| AppError::NotFound("Supply not found".to_string()))
    }

    pub async fn delete(state: &AppState, id: i64) -> Result<(), AppError> {
        if !state.storage.supplies.delete_supply(id).await? {
            return Err(AppError::NotFound("Supply not found".to_string()));
        }
        Ok(())
    }
}
