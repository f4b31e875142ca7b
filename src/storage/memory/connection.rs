use crate::storage::Storage;
use crate::storage::memory::InMemoryStore;
use std::sync::Arc;

pub fn memory_storage() -> Storage {
    let store = Arc::new(InMemoryStore::new());
    Storage {
        users: store.clone(),
        sessions: store.clone(),
        clients: store.clone(),
        contracts: store.clone(),
        workers: store.clone(),
        supplies: store.clone(),
        maintenances: store.clone(),
        ledger: store.clone(),
        finance: store.clone(),
        notifications: store,
    }
}
