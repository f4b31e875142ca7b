use async_trait::async_trait;

use crate::{
    errors::AppError,
    storage::{
        memory::InMemoryStore,
        models::{NewUser, Worker},
        traits::WorkerStore,
    },
};

#[async_trait]
impl WorkerStore for InMemoryStore {
    async fn list_workers(&self) -> Result<Vec<Worker>, AppError> {
        let mut workers: Vec<Worker> = self.read().workers.values().cloned().collect();
        workers.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(workers)
    }

    async fn get_worker(&self, id: i64) -> Result<Option<Worker>, AppError> {
        Ok(self.read().workers.get(&id).cloned())
    }

    async fn get_worker_by_uid(&self, uid: &str) -> Result<Option<Worker>, AppError> {
        Ok(self
            .read()
            .workers
            .values()
            .find(|w| w.uid == uid)
            .cloned())
    }

    async fn create_worker(&self, user: &NewUser, phone: &str) -> Result<Worker, AppError> {
        let mut tables = self.write();
        tables.check_username(&user.username)?;
        if tables.users.contains_key(&user.uid) {
            return Err(AppError::Conflict("User already exists".to_string()));
        }
        let stored = tables.insert_user(user);
        let worker = Worker {
            id: tables.next_id(),
            uid: stored.uid,
            username: stored.username,
            phone: phone.to_string(),
            active: true,
        };
        tables.workers.insert(worker.id, worker.clone());
        Ok(worker)
    }

    async fn update_worker(
        &self,
        id: i64,
        phone: &str,
        active: bool,
    ) -> Result<Option<Worker>, AppError> {
        let mut tables = self.write();
        let Some(worker) = tables.workers.get_mut(&id) else {
            return Ok(None);
        };
        worker.phone = phone.to_string();
        worker.active = active;
        Ok(Some(worker.clone()))
    }

    async fn delete_worker(&self, id: i64) -> Result<bool, AppError> {
        let mut tables = self.write();
        if tables.workers.remove(&id).is_none() {
            return Ok(false);
        }
        for visit in tables.maintenances.values_mut() {
            visit.worker_ids.retain(|w| *w != id);
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::traits::UserStore;

    fn new_user(uid: &str, username: &str) -> NewUser {
        NewUser {
            uid: uid.to_string(),
            username: username.to_string(),
            email: None,
            password_hash: "hash".to_string(),
            is_superuser: false,
            groups: vec!["trabajadores".to_string()],
        }
    }

    #[tokio::test]
    async fn failed_worker_creation_leaves_no_login_behind() {
        let store = InMemoryStore::new();
        store.create_user(&new_user("uid-1", "pedro")).await.unwrap();

        let err = store
            .create_worker(&new_user("uid-1", "maria"), "0991112233")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert!(store.get_user_by_username("maria").await.unwrap().is_none());
        assert!(store.list_workers().await.unwrap().is_empty());

        let worker = store
            .create_worker(&new_user("uid-2", "maria"), "0991112233")
            .await
            .unwrap();
        assert_eq!(worker.username, "maria");
        assert!(store.get_user_by_username("maria").await.unwrap().is_some());
    }
}
