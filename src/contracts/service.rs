use crate::{
    AppState,
    errors::AppError,
    storage::models::{ChecklistTemplate, Contract, ContractInput, ContractQuery, MAX_CENTS},
};

pub struct ContractService;

impl ContractService {
    async fn validate(state: &AppState, input: &ContractInput) -> Result<(), AppError> {
        if input.monthly_price_cents < 0 {
            return Err(AppError::BadRequest(
                "Monthly price cannot be negative".to_string(),
            ));
        }
        if input.monthly_price_cents > MAX_CENTS {
            return Err(AppError::BadRequest(
                "Monthly price is out of range".to_string(),
            ));
        }
        if state
            .storage
            .clients
            .get_client(input.client_id)
            .await?
            .is_none()
        {
            return Err(AppError::BadRequest("Client does not exist".to_string()));
        }
        Ok(())
    }

    pub async fn list(state: &AppState, query: &ContractQuery) -> Result<Vec<Contract>, AppError> {
        state.storage.contracts.list_contracts(query).await
    }

    pub async fn get(state: &AppState, id: i64) -> Result<Contract, AppError> {
        state
            .storage
            .contracts
            .get_contract(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Contract not found".to_string()))
    }

    pub async fn create(state: &AppState, input: &ContractInput) -> Result<Contract, AppError> {
        Self::validate(state, input).await?;
        state.storage.contracts.create_contract(input).await
    }

    pub async fn update(
        state: &AppState,
        id: i64,
        input: &ContractInput,
    ) -> Result<Contract, AppError> {
        Self::validate(state, input).await?;
        state
            .storage
            .contracts
            .update_contract(id, input)
            .await?
            .ok_or_else(|| AppError::NotFound("Contract not found".to_string()))
    }

    pub async fn delete(state: &AppState, id: i64) -> Result<(), AppError> {
        if !state.storage.contracts.delete_contract(id).await? {
            return Err(AppError::NotFound("Contract not found".to_string()));
        }
        Ok(())
    }

    pub async fn templates(
        state: &AppState,
        contract_id: i64,
    ) -> Result<Vec<ChecklistTemplate>, AppError> {
        Self::get(state, contract_id).await?;
        state.storage.contracts.list_templates(contract_id).await
    }

    pub async fn add_template(
        state: &AppState,
        contract_id: i64,
        description: &str,
    ) -> Result<ChecklistTemplate, AppError> {
        let description = description.trim();
        if description.is_empty() {
            return Err(AppError::BadRequest("Description is required".to_string()));
        }
        Self::get(state, contract_id).await?;
        state
            .storage
            .contracts
            .add_template(contract_id, description)
            .await
    }

    pub async fn delete_template(state: &AppState, id: i64) -> Result<(), AppError> {
        if !state.storage.contracts.delete_template(id).await? {
            return Err(AppError::NotFound("Checklist template not found".to_string()));
        }
        Ok(())
    }
}
