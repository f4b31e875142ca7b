use crate::storage::Storage;
use crate::storage::postgres::{
    PostgresClientStore, PostgresContractStore, PostgresFinanceStore, PostgresLedgerStore,
    PostgresMaintenanceStore, PostgresNotificationStore, PostgresSessionStore,
    PostgresSupplyStore, PostgresUserStore, PostgresWorkerStore,
};
use sqlx::PgPool;
use std::sync::Arc;

pub fn postgres_storage(pool: PgPool) -> Storage {
    Storage {
        users: Arc::new(PostgresUserStore::new(pool.clone())),
        sessions: Arc::new(PostgresSessionStore::new(pool.clone())),
        clients: Arc::new(PostgresClientStore::new(pool.clone())),
        contracts: Arc::new(PostgresContractStore::new(pool.clone())),
        workers: Arc::new(PostgresWorkerStore::new(pool.clone())),
        supplies: Arc::new(PostgresSupplyStore::new(pool.clone())),
        maintenances: Arc::new(PostgresMaintenanceStore::new(pool.clone())),
        ledger: Arc::new(PostgresLedgerStore::new(pool.clone())),
        finance: Arc::new(PostgresFinanceStore::new(pool.clone())),
        notifications: Arc::new(PostgresNotificationStore::new(pool)),
    }
}
