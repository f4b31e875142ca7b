pub mod clients;
pub mod connection;
pub mod finance;
pub mod ledger;
pub mod maintenances;
pub mod notifications;
pub mod supplies;
pub mod users;
pub mod workers;

pub use connection::memory_storage;

use std::collections::{BTreeMap, HashMap};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

use crate::storage::models::{
    ChecklistItem, ChecklistTemplate, Client, Contract, Expense, Income, Maintenance,
    RecurringMovement, StoredSession, StoredSubscription, StoredUser, Supply, SupplyUsage, Worker,
};

/// Every table of the in-memory backend behind one lock, so multi-table
/// operations are atomic the same way a Postgres transaction is.
#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

#[derive(Default)]
pub(crate) struct Tables {
    next_id: i64,
    users: BTreeMap<String, StoredUser>,
    sessions: HashMap<Uuid, StoredSession>,
    clients: BTreeMap<i64, Client>,
    contracts: BTreeMap<i64, Contract>,
    templates: BTreeMap<i64, ChecklistTemplate>,
    workers: BTreeMap<i64, Worker>,
    supplies: BTreeMap<i64, Supply>,
    maintenances: BTreeMap<i64, Maintenance>,
    checklist: BTreeMap<i64, ChecklistItem>,
    usages: BTreeMap<i64, SupplyUsage>,
    expenses: BTreeMap<i64, Expense>,
    incomes: BTreeMap<i64, Income>,
    recurring: BTreeMap<i64, RecurringMovement>,
    subscriptions: BTreeMap<i64, StoredSubscription>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn read(&self) -> RwLockReadGuard<'_, Tables> {
        self.tables.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, Tables> {
        self.tables.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    /// Puts a usage's quantity back on its supply.
    fn restore_stock(&mut self, usage: &SupplyUsage) {
        if let Some(supply) = self.supplies.get_mut(&usage.supply_id) {
            supply.stock = supply.stock.saturating_add(usage.quantity);
        }
    }

    fn remove_maintenance(&mut self, id: i64) -> bool {
        if self.maintenances.remove(&id).is_none() {
            return false;
        }
        let usages: Vec<SupplyUsage> = self
            .usages
            .values()
            .filter(|u| u.maintenance_id == id)
            .cloned()
            .collect();
        for usage in &usages {
            self.restore_stock(usage);
            self.usages.remove(&usage.id);
        }
        self.expenses.retain(|_, e| e.maintenance_id != id);
        self.checklist.retain(|_, c| c.maintenance_id != id);
        true
    }

    fn remove_contract(&mut self, id: i64) -> bool {
        if self.contracts.remove(&id).is_none() {
            return false;
        }
        let visits: Vec<i64> = self
            .maintenances
            .values()
            .filter(|m| m.contract_id == id)
            .map(|m| m.id)
            .collect();
        for visit in visits {
            self.remove_maintenance(visit);
        }
        self.templates.retain(|_, t| t.contract_id != id);
        true
    }
}
