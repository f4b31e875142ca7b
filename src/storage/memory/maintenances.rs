use std::collections::BTreeSet;

use async_trait::async_trait;

use crate::{
    errors::AppError,
    storage::{
        memory::{InMemoryStore, Tables},
        models::{
            ChecklistItem, Maintenance, MaintenanceQuery, MaintenanceStatus, MaintenanceUpdate,
            NewMaintenance,
        },
        traits::MaintenanceStore,
    },
};

impl Tables {
    fn check_workers(&self, worker_ids: &[i64]) -> Result<(), AppError> {
        match worker_ids.iter().find(|w| !self.workers.contains_key(w)) {
            Some(missing) => Err(AppError::BadRequest(format!(
                "Worker {} does not exist",
                missing
            ))),
            None => Ok(()),
        }
    }
}

fn dedup(ids: &[i64]) -> Vec<i64> {
    let mut ids = ids.to_vec();
    ids.sort_unstable();
    ids.dedup();
    ids
}

#[async_trait]
impl MaintenanceStore for InMemoryStore {
    async fn create_maintenance(&self, new: &NewMaintenance) -> Result<Maintenance, AppError> {
        let mut tables = self.write();
        if !tables.contracts.contains_key(&new.contract_id) {
            return Err(AppError::BadRequest("Contract does not exist".to_string()));
        }
        tables.check_workers(&new.worker_ids)?;
        let maintenance = Maintenance {
            id: tables.next_id(),
            client_id: new.client_id,
            contract_id: new.contract_id,
            date: new.date,
            worker_ids: dedup(&new.worker_ids),
            status: MaintenanceStatus::Pending,
            notes: new.notes.clone(),
        };
        tables
            .maintenances
            .insert(maintenance.id, maintenance.clone());

        let descriptions: Vec<String> = tables
            .templates
            .values()
            .filter(|t| t.contract_id == new.contract_id)
            .map(|t| t.description.clone())
            .collect();
        for description in descriptions {
            let item = ChecklistItem {
                id: tables.next_id(),
                maintenance_id: maintenance.id,
                description,
                done: false,
                notes: String::new(),
            };
            tables.checklist.insert(item.id, item);
        }
        Ok(maintenance)
    }

    async fn get_maintenance(&self, id: i64) -> Result<Option<Maintenance>, AppError> {
        Ok(self.read().maintenances.get(&id).cloned())
    }

    async fn list_maintenances(
        &self,
        query: &MaintenanceQuery,
    ) -> Result<Vec<Maintenance>, AppError> {
        let mut visits: Vec<Maintenance> = self
            .read()
            .maintenances
            .values()
            .filter(|m| query.matches(m))
            .cloned()
            .collect();
        visits.sort_by(|a, b| a.date.cmp(&b.date).then(a.id.cmp(&b.id)));
        if let Some(limit) = query.limit {
            visits.truncate(limit);
        }
        Ok(visits)
    }

    async fn update_maintenance(
        &self,
        id: i64,
        update: &MaintenanceUpdate,
    ) -> Result<Option<Maintenance>, AppError> {
        let mut tables = self.write();
        tables.check_workers(&update.worker_ids)?;
        let Some(visit) = tables.maintenances.get_mut(&id) else {
            return Ok(None);
        };
        visit.date = update.date;
        visit.worker_ids = dedup(&update.worker_ids);
        visit.status = update.status;
        visit.notes = update.notes.clone();
        Ok(Some(visit.clone()))
    }

    async fn assigned_worker_ids(&self) -> Result<Vec<i64>, AppError> {
        let ids: BTreeSet<i64> = self
            .read()
            .maintenances
            .values()
            .flat_map(|m| m.worker_ids.iter().copied())
            .collect();
        Ok(ids.into_iter().collect())
    }

    async fn delete_maintenance(&self, id: i64) -> Result<bool, AppError> {
        Ok(self.write().remove_maintenance(id))
    }

    async fn checklist(&self, maintenance_id: i64) -> Result<Vec<ChecklistItem>, AppError> {
        Ok(self
            .read()
            .checklist
            .values()
            .filter(|c| c.maintenance_id == maintenance_id)
            .cloned()
            .collect())
    }

    async fn add_checklist_item(
        &self,
        maintenance_id: i64,
        description: &str,
    ) -> Result<ChecklistItem, AppError> {
        let mut tables = self.write();
        if !tables.maintenances.contains_key(&maintenance_id) {
            return Err(AppError::NotFound("Maintenance not found".to_string()));
        }
        let item = ChecklistItem {
            id: tables.next_id(),
            maintenance_id,
            description: description.to_string(),
            done: false,
            notes: String::new(),
        };
        tables.checklist.insert(item.id, item.clone());
        Ok(item)
    }

    async fn get_checklist_item(&self, id: i64) -> Result<Option<ChecklistItem>, AppError> {
        Ok(self.read().checklist.get(&id).cloned())
    }

    async fn update_checklist_item(
        &self,
        id: i64,
        done: Option<bool>,
        notes: Option<&str>,
    ) -> Result<Option<ChecklistItem>, AppError> {
        let mut tables = self.write();
        let Some(item) = tables.checklist.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(done) = done {
            item.done = done;
        }
        if let Some(notes) = notes {
            item.notes = notes.to_string();
        }
        Ok(Some(item.clone()))
    }
}
