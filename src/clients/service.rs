use crate::{
    AppState,
    errors::AppError,
    storage::models::{Client, ClientInput, ClientQuery},
};

pub struct ClientService;

fn validate(input: &ClientInput) -> Result<(), AppError> {
    if input.name.trim().is_empty() || input.phone.trim().is_empty() {
        return Err(AppError::BadRequest(
            "Client name and phone are required".to_string(),
        ));
    }
    Ok(())
}

impl ClientService {
    pub async fn list(state: &AppState, query: &ClientQuery) -> Result<Vec<Client>, AppError> {
        state.storage.clients.list_clients(query).await
    }

    pub async fn get(state: &AppState, id: i64) -> Result<Client, AppError> {
        state
            .storage
            .clients
            .get_client(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Client not found".to_string()))
    }

    pub async fn create(state: &AppState, input: &ClientInput) -> Result<Client, AppError> {
        validate(input)?;
        state.storage.clients.create_client(input).await
    }

    pub async fn update(
        state: &AppState,
        id: i64,
        input: &ClientInput,
    ) -> Result<Client, AppError> {
        validate(input)?;
        state
            .storage
            .clients
            .update_client(id, input)
            .await?
            .ok_or_else(|| AppError::NotFound("Client not found".to_string()))
    }

    /// Contracts and visits go with the client; incomes block the delete.
    pub async fn delete(state: &AppState, id: i64) -> Result<(), AppError> {
        if !state.storage.clients.delete_client(id).await? {
            return Err(AppError::NotFound("Client not found".to_string()));
        }
        Ok(())
    }
}
