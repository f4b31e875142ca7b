use async_trait::async_trait;
use time::{Date, OffsetDateTime};
use uuid::Uuid;
use web_push::SubscriptionInfo;

use crate::{
    errors::AppError,
    storage::models::{
        Cents, ChecklistItem, ChecklistTemplate, Client, ClientInput, ClientQuery, Contract,
        ContractInput, ContractQuery, DateRange, Expense, ExpenseQuery, Income, IncomeInput,
        Maintenance, MaintenanceQuery, MaintenanceUpdate, NewMaintenance, NewUser,
        RecurringInput, RecurringMovement, StoredSession, StoredSubscription, StoredUser, Supply,
        SupplyInput, SupplyUsage, Worker,
    },
};

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get_user_by_uid(&self, uid: &str) -> Result<Option<StoredUser>, AppError>;

    async fn get_user_by_username(&self, username: &str)
    -> Result<Option<StoredUser>, AppError>;

    /// Fails with `Conflict` when the username is taken.
    async fn create_user(&self, user: &NewUser) -> Result<StoredUser, AppError>;

    async fn reset_superuser(
        &self,
        uid: &str,
        password_hash: &str,
        email: Option<&str>,
    ) -> Result<(), AppError>;

    async fn list_users(&self) -> Result<Vec<StoredUser>, AppError>;
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn create_session(&self, session: &StoredSession) -> Result<(), AppError>;

    /// Replaces an unexpired session token, returning the owning uid.
    async fn rotate_session(
        &self,
        old_token: &Uuid,
        new_token: &Uuid,
        user_agent: &str,
        expires_at: OffsetDateTime,
    ) -> Result<Option<String>, AppError>;

    /// Deletes the token only when it belongs to `uid`.
    async fn delete_session(&self, token: &Uuid, uid: &str) -> Result<bool, AppError>;
}

#[async_trait]
pub trait ClientStore: Send + Sync {
    async fn list_clients(&self, query: &ClientQuery) -> Result<Vec<Client>, AppError>;

    async fn get_client(&self, id: i64) -> Result<Option<Client>, AppError>;

    async fn create_client(&self, input: &ClientInput) -> Result<Client, AppError>;

    async fn update_client(&self, id: i64, input: &ClientInput)
    -> Result<Option<Client>, AppError>;

    /// Cascades to contracts and maintenances, restoring consumed stock.
    async fn delete_client(&self, id: i64) -> Result<bool, AppError>;
}

#[async_trait]
pub trait ContractStore: Send + Sync {
    async fn list_contracts(&self, query: &ContractQuery) -> Result<Vec<Contract>, AppError>;

    async fn get_contract(&self, id: i64) -> Result<Option<Contract>, AppError>;

    async fn create_contract(&self, input: &ContractInput) -> Result<Contract, AppError>;

    async fn update_contract(
        &self,
        id: i64,
        input: &ContractInput,
    ) -> Result<Option<Contract>, AppError>;

    /// Cascades to maintenances and templates, restoring consumed stock.
    async fn delete_contract(&self, id: i64) -> Result<bool, AppError>;

    async fn active_monthly_total(&self) -> Result<Cents, AppError>;

    async fn list_templates(&self, contract_id: i64) -> Result<Vec<ChecklistTemplate>, AppError>;

    async fn add_template(
        &self,
        contract_id: i64,
        description: &str,
    ) -> Result<ChecklistTemplate, AppError>;

    async fn delete_template(&self, id: i64) -> Result<bool, AppError>;
}

#[async_trait]
pub trait WorkerStore: Send + Sync {
    async fn list_workers(&self) -> Result<Vec<Worker>, AppError>;

    async fn get_worker(&self, id: i64) -> Result<Option<Worker>, AppError>;

    async fn get_worker_by_uid(&self, uid: &str) -> Result<Option<Worker>, AppError>;

    /// Creates the login account and its worker profile in one step; nothing
    /// is stored when either fails.
    async fn create_worker(&self, user: &NewUser, phone: &str) -> Result<Worker, AppError>;

    async fn update_worker(
        &self,
        id: i64,
        phone: &str,
        active: bool,
    ) -> Result<Option<Worker>, AppError>;

    /// Also removes the worker from every maintenance assignment.
    async fn delete_worker(&self, id: i64) -> Result<bool, AppError>;
}

#[async_trait]
pub trait SupplyStore: Send + Sync {
    async fn list_supplies(&self, low_stock_only: bool) -> Result<Vec<Supply>, AppError>;

    async fn get_supply(&self, id: i64) -> Result<Option<Supply>, AppError>;

    async fn create_supply(&self, input: &SupplyInput) -> Result<Supply, AppError>;

    async fn update_supply(&self, id: i64, input: &SupplyInput)
    -> Result<Option<Supply>, AppError>;

    /// Fails with `Conflict` while expenses reference the supply.
    async fn delete_supply(&self, id: i64) -> Result<bool, AppError>;
}

#[async_trait]
pub trait MaintenanceStore: Send + Sync {
    /// Creates the visit and copies the contract's checklist templates onto it.
    async fn create_maintenance(&self, new: &NewMaintenance) -> Result<Maintenance, AppError>;

    async fn get_maintenance(&self, id: i64) -> Result<Option<Maintenance>, AppError>;

    /// Ordered by date, then id.
    async fn list_maintenances(
        &self,
        query: &MaintenanceQuery,
    ) -> Result<Vec<Maintenance>, AppError>;

    async fn update_maintenance(
        &self,
        id: i64,
        update: &MaintenanceUpdate,
    ) -> Result<Option<Maintenance>, AppError>;

    /// Distinct ids of the workers assigned to any visit, in ascending order.
    async fn assigned_worker_ids(&self) -> Result<Vec<i64>, AppError>;

    /// Restores the stock of every usage recorded on the visit.
    async fn delete_maintenance(&self, id: i64) -> Result<bool, AppError>;

    async fn checklist(&self, maintenance_id: i64) -> Result<Vec<ChecklistItem>, AppError>;

    async fn add_checklist_item(
        &self,
        maintenance_id: i64,
        description: &str,
    ) -> Result<ChecklistItem, AppError>;

    async fn get_checklist_item(&self, id: i64) -> Result<Option<ChecklistItem>, AppError>;

    async fn update_checklist_item(
        &self,
        id: i64,
        done: Option<bool>,
        notes: Option<&str>,
    ) -> Result<Option<ChecklistItem>, AppError>;
}

/// Stock movements and the expenses that account for them. Every method is atomic.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Decrements stock, books an expense at the current supply price and links a usage.
    async fn record_usage(
        &self,
        maintenance_id: i64,
        supply_id: i64,
        quantity: i64,
        date: Date,
    ) -> Result<SupplyUsage, AppError>;

    async fn update_usage(&self, id: i64, quantity: i64) -> Result<SupplyUsage, AppError>;

    async fn delete_usage(&self, id: i64) -> Result<bool, AppError>;

    async fn get_usage(&self, id: i64) -> Result<Option<SupplyUsage>, AppError>;

    async fn usages_for(&self, maintenance_id: i64) -> Result<Vec<SupplyUsage>, AppError>;

    async fn list_expenses(&self, query: &ExpenseQuery) -> Result<Vec<Expense>, AppError>;

    async fn get_expense(&self, id: i64) -> Result<Option<Expense>, AppError>;

    /// Restores stock and removes the linked usage.
    async fn delete_expense(&self, id: i64) -> Result<bool, AppError>;

    async fn expenses_total(&self, range: &DateRange) -> Result<Cents, AppError>;
}

#[async_trait]
pub trait FinanceStore: Send + Sync {
    async fn list_incomes(&self, range: &DateRange) -> Result<Vec<Income>, AppError>;

    async fn get_income(&self, id: i64) -> Result<Option<Income>, AppError>;

    async fn create_income(&self, input: &IncomeInput) -> Result<Income, AppError>;

    async fn update_income(&self, id: i64, input: &IncomeInput)
    -> Result<Option<Income>, AppError>;

    async fn delete_income(&self, id: i64) -> Result<bool, AppError>;

    async fn incomes_total(&self, range: &DateRange) -> Result<Cents, AppError>;

    async fn list_recurring(&self) -> Result<Vec<RecurringMovement>, AppError>;

    async fn get_recurring(&self, id: i64) -> Result<Option<RecurringMovement>, AppError>;

    async fn create_recurring(&self, input: &RecurringInput)
    -> Result<RecurringMovement, AppError>;

    async fn update_recurring(
        &self,
        id: i64,
        input: &RecurringInput,
    ) -> Result<Option<RecurringMovement>, AppError>;

    async fn delete_recurring(&self, id: i64) -> Result<bool, AppError>;
}

#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// Upsert keyed by endpoint; returns the row and whether it was newly created.
    async fn upsert_subscription(
        &self,
        uid: &str,
        subscription: &SubscriptionInfo,
        user_agent: Option<&str>,
    ) -> Result<(StoredSubscription, bool), AppError>;

    async fn subscriptions_for(&self, uids: &[String])
    -> Result<Vec<StoredSubscription>, AppError>;

    async fn delete_endpoint(&self, endpoint: &str) -> Result<bool, AppError>;

    async fn delete_user_endpoint(&self, uid: &str, endpoint: &str) -> Result<bool, AppError>;
}
