use tracing::info;
use uuid::Uuid;

use crate::{
    AppState,
    auth::{local::hash_password, roles::WORKER_GROUP},
    errors::AppError,
    storage::models::{NewUser, Worker},
};

pub struct WorkerService;

impl WorkerService {
    /// Creates the login account in the workers group together with its worker profile.
    pub async fn create(
        state: &AppState,
        username: &str,
        password: &str,
        phone: &str,
    ) -> Result<Worker, AppError> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(AppError::BadRequest(
                "Username and password are required".to_string(),
            ));
        }

        let user = NewUser {
            uid: Uuid::new_v4().to_string(),
            username: username.to_string(),
            email: None,
            password_hash: hash_password(password)?,
            is_superuser: false,
            groups: vec![WORKER_GROUP.to_string()],
        };
        let worker = state
            .storage
            .workers
            .create_worker(&user, phone.trim())
            .await?;
        info!("Worker {} created", worker.username);
        Ok(worker)
    }

    pub async fn list(state: &AppState) -> Result<Vec<Worker>, AppError> {
        state.storage.workers.list_workers().await
    }

    pub async fn get(state: &AppState, id: i64) -> Result<Worker, AppError> {
        state
            .storage
            .workers
            .get_worker(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Worker not found".to_string()))
    }

    /// The worker profile of a logged-in user, if any.
    pub async fn for_user(state: &AppState, uid: &str) -> Result<Option<Worker>, AppError> {
        state.storage.workers.get_worker_by_uid(uid).await
    }

    pub async fn update(
        state: &AppState,
        id: i64,
        phone: &str,
        active: bool,
    ) -> Result<Worker, AppError> {
        state
            .storage
            .workers
            .update_worker(id, phone.trim(), active)
            .await?
            .ok_or_else(|| AppError::NotFound("Worker not found".to_string()))
    }

    pub async fn delete(state: &AppState, id: i64) -> Result<(), AppError> {
        if !state.storage.workers.delete_worker(id).await? {
            return Err(AppError::NotFound("Worker not found".to_string()));
        }
        Ok(())
    }
}
