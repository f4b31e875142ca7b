use serde::Serialize;
use time::Date;
use tracing::{error, info};

use crate::{
    AppState,
    auth::{Claims, Role},
    errors::AppError,
    notifications::NotificationPayload,
    storage::models::{
        Cents, ChecklistItem, ExpenseQuery, Maintenance, MaintenanceQuery, MaintenanceStatus,
        MaintenanceUpdate, NewMaintenance, SupplyUsage,
    },
    workers::WorkerService,
};

/// A visit with everything recorded against it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceDetail {
    #[serde(flatten)]
    pub maintenance: Maintenance,
    pub usages: Vec<SupplyUsage>,
    pub checklist: Vec<ChecklistItem>,
    pub total_expenses_cents: Cents,
}

/// Partial edit; absent fields keep their value.
#[derive(Debug, Default)]
pub struct MaintenanceChanges {
    pub date: Option<Date>,
    pub worker_ids: Option<Vec<i64>>,
    pub status: Option<MaintenanceStatus>,
    pub notes: Option<String>,
}

pub struct MaintenanceService;

impl MaintenanceService {
    pub async fn get(state: &AppState, id: i64) -> Result<Maintenance, AppError> {
        state
            .storage
            .maintenances
            .get_maintenance(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Maintenance not found".to_string()))
    }

    /// Admins may act on any visit, workers only on the ones assigned to them.
    pub async fn authorize(
        state: &AppState,
        claims: &Claims,
        maintenance: &Maintenance,
    ) -> Result<(), AppError> {
        if claims.is_admin() {
            return Ok(());
        }
        if claims.is_worker() {
            if let Some(worker) = WorkerService::for_user(state, &claims.sub).await? {
                if maintenance.is_assigned_to(worker.id) {
                    return Ok(());
                }
            }
        }
        Err(AppError::Forbidden(
            "Maintenance is not assigned to you".to_string(),
        ))
    }

    async fn check_workers(state: &AppState, worker_ids: &[i64]) -> Result<(), AppError> {
        for id in worker_ids {
            if state.storage.workers.get_worker(*id).await?.is_none() {
                return Err(AppError::BadRequest(format!("Worker {} does not exist", id)));
            }
        }
        Ok(())
    }

    pub async fn create(
        state: &AppState,
        contract_id: i64,
        client_id: Option<i64>,
        date: Date,
        worker_ids: Vec<i64>,
        notes: String,
    ) -> Result<Maintenance, AppError> {
        let contract = state
            .storage
            .contracts
            .get_contract(contract_id)
            .await?
            .ok_or_else(|| AppError::BadRequest("Contract does not exist".to_string()))?;
        if client_id.is_some_and(|c| c != contract.client_id) {
            return Err(AppError::BadRequest(
                "Client does not match the contract".to_string(),
            ));
        }
        Self::check_workers(state, &worker_ids).await?;

        let maintenance = state
            .storage
            .maintenances
            .create_maintenance(&NewMaintenance {
                client_id: contract.client_id,
                contract_id,
                date,
                worker_ids,
                notes,
            })
            .await?;
        info!(
            "Maintenance {} scheduled for {}",
            maintenance.id, maintenance.date
        );

        Self::notify_assigned(state, &maintenance, &maintenance.worker_ids).await;
        Ok(maintenance)
    }

    pub async fn list(
        state: &AppState,
        claims: &Claims,
        mut query: MaintenanceQuery,
    ) -> Result<Vec<Maintenance>, AppError> {
        if !claims.is_admin() {
            if !claims.is_worker() {
                return Err(AppError::Forbidden("No role assigned".to_string()));
            }
            let Some(worker) = WorkerService::for_user(state, &claims.sub).await? else {
                return Ok(Vec::new());
            };
            query.worker_id = Some(worker.id);
        }
        state.storage.maintenances.list_maintenances(&query).await
    }

    pub async fn detail(
        state: &AppState,
        claims: &Claims,
        id: i64,
    ) -> Result<MaintenanceDetail, AppError> {
        let maintenance = Self::get(state, id).await?;
        Self::authorize(state, claims, &maintenance).await?;

        let usages = state.storage.ledger.usages_for(id).await?;
        let checklist = state.storage.maintenances.checklist(id).await?;
        let total_expenses_cents = state
            .storage
            .ledger
            .list_expenses(&ExpenseQuery {
                maintenance_id: Some(id),
                ..ExpenseQuery::default()
            })
            .await?
            .iter()
            .map(|e| e.total_cents)
            .sum();

        Ok(MaintenanceDetail {
            maintenance,
            usages,
            checklist,
            total_expenses_cents,
        })
    }

    pub async fn update(
        state: &AppState,
        id: i64,
        changes: MaintenanceChanges,
    ) -> Result<Maintenance, AppError> {
        let current = Self::get(state, id).await?;
        if let Some(worker_ids) = &changes.worker_ids {
            Self::check_workers(state, worker_ids).await?;
        }

        let update = MaintenanceUpdate {
            date: changes.date.unwrap_or(current.date),
            worker_ids: changes
                .worker_ids
                .unwrap_or_else(|| current.worker_ids.clone()),
            status: changes.status.unwrap_or(current.status),
            notes: changes.notes.unwrap_or_else(|| current.notes.clone()),
        };
        let updated = state
            .storage
            .maintenances
            .update_maintenance(id, &update)
            .await?
            .ok_or_else(|| AppError::NotFound("Maintenance not found".to_string()))?;

        let added: Vec<i64> = updated
            .worker_ids
            .iter()
            .copied()
            .filter(|w| !current.is_assigned_to(*w))
            .collect();
        Self::notify_assigned(state, &updated, &added).await;
        Ok(updated)
    }

    /// Marks the visit done and tells the administrators.
    pub async fn complete(
        state: &AppState,
        claims: &Claims,
        id: i64,
    ) -> Result<Maintenance, AppError> {
        let current = Self::get(state, id).await?;
        Self::authorize(state, claims, &current).await?;

        let update = MaintenanceUpdate {
            date: current.date,
            worker_ids: current.worker_ids.clone(),
            status: MaintenanceStatus::Done,
            notes: current.notes.clone(),
        };
        let updated = state
            .storage
            .maintenances
            .update_maintenance(id, &update)
            .await?
            .ok_or_else(|| AppError::NotFound("Maintenance not found".to_string()))?;

        let client = Self::client_name(state, updated.client_id).await;
        let payload = NotificationPayload::new(
            "Mantenimiento realizado",
            format!("{} - {} ({})", client, updated.date, claims.username),
        )
        .with_url(format!("/dashboard/maintenances/{}", updated.id));
        match state
            .notification_service
            .notify_role(Role::Admin, &payload)
            .await
        {
            Ok(report) => info!("Completion of {} notified: {:?}", updated.id, report),
            Err(e) => error!("Failed to notify completion of {}: {:?}", updated.id, e),
        }
        Ok(updated)
    }

    pub async fn delete(state: &AppState, id: i64) -> Result<(), AppError> {
        if !state.storage.maintenances.delete_maintenance(id).await? {
            return Err(AppError::NotFound("Maintenance not found".to_string()));
        }
        Ok(())
    }

    pub async fn add_checklist_item(
        state: &AppState,
        id: i64,
        description: &str,
    ) -> Result<ChecklistItem, AppError> {
        let description = description.trim();
        if description.is_empty() {
            return Err(AppError::BadRequest("Description is required".to_string()));
        }
        Self::get(state, id).await?;
        state
            .storage
            .maintenances
            .add_checklist_item(id, description)
            .await
    }

    pub async fn update_checklist_item(
        state: &AppState,
        claims: &Claims,
        item_id: i64,
        done: Option<bool>,
        notes: Option<&str>,
    ) -> Result<ChecklistItem, AppError> {
        let not_found = || AppError::NotFound("Checklist item not found".to_string());
        let item = state
            .storage
            .maintenances
            .get_checklist_item(item_id)
            .await?
            .ok_or_else(not_found)?;
        let maintenance = Self::get(state, item.maintenance_id).await?;
        Self::authorize(state, claims, &maintenance).await?;

        state
            .storage
            .maintenances
            .update_checklist_item(item_id, done, notes)
            .await?
            .ok_or_else(not_found)
    }

    async fn client_name(state: &AppState, client_id: i64) -> String {
        match state.storage.clients.get_client(client_id).await {
            Ok(Some(client)) => client.name,
            _ => format!("Cliente {}", client_id),
        }
    }

    /// Best effort: a push failure never fails the request that caused it.
    async fn notify_assigned(state: &AppState, maintenance: &Maintenance, worker_ids: &[i64]) {
        if worker_ids.is_empty() {
            return;
        }
        let mut uids = Vec::with_capacity(worker_ids.len());
        for id in worker_ids {
            match state.storage.workers.get_worker(*id).await {
                Ok(Some(worker)) => uids.push(worker.uid),
                Ok(None) => {}
                Err(e) => error!("Failed to load worker {}: {:?}", id, e),
            }
        }

        let client = Self::client_name(state, maintenance.client_id).await;
        let payload = NotificationPayload::new(
            "Nuevo mantenimiento",
            format!("{} - {}", client, maintenance.date),
        )
        .with_url(format!("/dashboard/maintenances/{}", maintenance.id));
        match state
            .notification_service
            .notify_users(&uids, &payload)
            .await
        {
            Ok(report) => info!(
                "Assignment of {} notified: {:?}",
                maintenance.id, report
            ),
            Err(e) => error!(
                "Failed to notify assignment of {}: {:?}",
                maintenance.id, e
            ),
        }
    }
}
