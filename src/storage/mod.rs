pub mod memory;
pub mod models;
pub mod postgres;
pub mod traits;

use crate::storage::traits::*;
use std::sync::Arc;

#[derive(Clone)]
pub struct Storage {
    pub users: Arc<dyn UserStore>,
    pub sessions: Arc<dyn SessionStore>,
    pub clients: Arc<dyn ClientStore>,
    pub contracts: Arc<dyn ContractStore>,
    pub workers: Arc<dyn WorkerStore>,
    pub supplies: Arc<dyn SupplyStore>,
    pub maintenances: Arc<dyn MaintenanceStore>,
    pub ledger: Arc<dyn LedgerStore>,
    pub finance: Arc<dyn FinanceStore>,
    pub notifications: Arc<dyn NotificationStore>,
}
