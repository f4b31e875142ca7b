//! Records persisted by the storage backends.
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use time::{Date, OffsetDateTime};
use uuid::Uuid;
use web_push::{SubscriptionInfo, SubscriptionKeys};

use crate::errors::AppError;

/// Money is kept in integer cents.
pub type Cents = i64;

/// Upper bound for stock levels and usage quantities.
pub const MAX_QUANTITY: i64 = 1_000_000_000;

/// Upper bound for any single price or amount. Together with `MAX_QUANTITY`
/// an expense line always fits in an `i64`.
pub const MAX_CENTS: Cents = 1_000_000_000;

/// `quantity × unit_cost_cents`, rejected when it does not fit in cents.
pub fn line_total(quantity: i64, unit_cost_cents: Cents) -> Result<Cents, AppError> {
    quantity
        .checked_mul(unit_cost_cents)
        .ok_or_else(|| AppError::BadRequest("Expense total is out of range".to_string()))
}

macro_rules! wire_enum {
    ($name:ident { $($variant:ident => $wire:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $wire)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = anyhow::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($wire => Ok($name::$variant),)+
                    other => Err(anyhow::anyhow!(
                        "invalid {} value: {}",
                        stringify!($name),
                        other
                    )),
                }
            }
        }
    };
}

wire_enum!(ContractKind {
    Weekly => "semanal",
    Biweekly => "quincenal",
    Monthly => "mensual",
    Variable => "variable",
});

// Pending sorts before Done.
wire_enum!(MaintenanceStatus {
    Pending => "pendiente",
    Done => "realizado",
});

wire_enum!(MovementKind {
    Income => "ingreso",
    Expense => "egreso",
});

wire_enum!(Frequency {
    Monthly => "mensual",
    Weekly => "semanal",
});

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredUser {
    pub uid: String,
    pub username: String,
    pub email: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_superuser: bool,
    pub groups: Vec<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub uid: String,
    pub username: String,
    pub email: Option<String>,
    pub password_hash: String,
    pub is_superuser: bool,
    pub groups: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct StoredSession {
    pub token: Uuid,
    pub uid: String,
    pub user_agent: String,
    pub expires_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: i64,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub address: String,
    pub active: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub registered_at: OffsetDateTime,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientInput {
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: String,
    #[serde(default = "default_true")]
    pub active: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientQuery {
    pub search: Option<String>,
    pub active: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Contract {
    pub id: i64,
    pub client_id: i64,
    pub kind: ContractKind,
    pub monthly_price_cents: Cents,
    pub start_date: Date,
    pub active: bool,
}

impl Contract {
    pub fn monthly_income(&self) -> Cents {
        self.monthly_price_cents
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractInput {
    pub client_id: i64,
    pub kind: ContractKind,
    pub monthly_price_cents: Cents,
    pub start_date: Date,
    #[serde(default = "default_true")]
    pub active: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractQuery {
    pub kind: Option<ContractKind>,
    pub active: Option<bool>,
    pub client_id: Option<i64>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistTemplate {
    pub id: i64,
    pub contract_id: i64,
    pub description: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Worker {
    pub id: i64,
    pub uid: String,
    pub username: String,
    pub phone: String,
    pub active: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Supply {
    pub id: i64,
    pub name: String,
    pub stock: i64,
    pub min_stock: i64,
    pub price_cents: Cents,
}

impl Supply {
    pub fn low_stock(&self) -> bool {
        self.stock <= self.min_stock
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplyInput {
    pub name: String,
    #[serde(default)]
    pub stock: i64,
    #[serde(default = "default_min_stock")]
    pub min_stock: i64,
    pub price_cents: Cents,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Maintenance {
    pub id: i64,
    pub client_id: i64,
    pub contract_id: i64,
    pub date: Date,
    pub worker_ids: Vec<i64>,
    pub status: MaintenanceStatus,
    pub notes: String,
}

impl Maintenance {
    pub fn is_assigned_to(&self, worker_id: i64) -> bool {
        self.worker_ids.contains(&worker_id)
    }
}

#[derive(Debug, Clone)]
pub struct NewMaintenance {
    pub client_id: i64,
    pub contract_id: i64,
    pub date: Date,
    pub worker_ids: Vec<i64>,
    pub notes: String,
}

#[derive(Debug, Clone)]
pub struct MaintenanceUpdate {
    pub date: Date,
    pub worker_ids: Vec<i64>,
    pub status: MaintenanceStatus,
    pub notes: String,
}

/// Date filters are inclusive for `from`/`to` and strict for `before`/`after`.
#[derive(Debug, Clone, Default)]
pub struct MaintenanceQuery {
    pub on: Option<Date>,
    pub from: Option<Date>,
    pub to: Option<Date>,
    pub before: Option<Date>,
    pub after: Option<Date>,
    pub status: Option<MaintenanceStatus>,
    pub worker_id: Option<i64>,
    pub limit: Option<usize>,
}

impl MaintenanceQuery {
    pub fn matches(&self, m: &Maintenance) -> bool {
        self.on.is_none_or(|d| m.date == d)
            && self.from.is_none_or(|d| m.date >= d)
            && self.to.is_none_or(|d| m.date <= d)
            && self.before.is_none_or(|d| m.date < d)
            && self.after.is_none_or(|d| m.date > d)
            && self.status.is_none_or(|s| m.status == s)
            && self.worker_id.is_none_or(|w| m.is_assigned_to(w))
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistItem {
    pub id: i64,
    pub maintenance_id: i64,
    pub description: String,
    pub done: bool,
    pub notes: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplyUsage {
    pub id: i64,
    pub maintenance_id: i64,
    pub supply_id: i64,
    pub quantity: i64,
    pub expense_id: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: i64,
    pub maintenance_id: i64,
    pub supply_id: i64,
    pub quantity: i64,
    pub unit_cost_cents: Cents,
    pub total_cents: Cents,
    pub date: Date,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseQuery {
    pub from: Option<Date>,
    pub to: Option<Date>,
    pub maintenance_id: Option<i64>,
}

impl ExpenseQuery {
    pub fn matches(&self, e: &Expense) -> bool {
        self.from.is_none_or(|d| e.date >= d)
            && self.to.is_none_or(|d| e.date <= d)
            && self.maintenance_id.is_none_or(|m| e.maintenance_id == m)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Income {
    pub id: i64,
    pub client_id: Option<i64>,
    pub contract_id: Option<i64>,
    pub concept: String,
    pub total_cents: Cents,
    pub date: Date,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeInput {
    #[serde(default)]
    pub client_id: Option<i64>,
    #[serde(default)]
    pub contract_id: Option<i64>,
    pub concept: String,
    pub total_cents: Cents,
    pub date: Date,
}

/// Inclusive date range filter.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub from: Option<Date>,
    pub to: Option<Date>,
}

impl DateRange {
    pub fn contains(&self, date: Date) -> bool {
        self.from.is_none_or(|d| date >= d) && self.to.is_none_or(|d| date <= d)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurringMovement {
    pub id: i64,
    pub kind: MovementKind,
    pub concept: String,
    pub amount_cents: Cents,
    pub frequency: Frequency,
    pub next_date: Date,
    pub active: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurringInput {
    pub kind: MovementKind,
    pub concept: String,
    pub amount_cents: Cents,
    #[serde(default = "default_frequency")]
    pub frequency: Frequency,
    pub next_date: Date,
    #[serde(default = "default_true")]
    pub active: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredSubscription {
    pub id: i64,
    pub uid: String,
    pub endpoint: String,
    pub p256dh: String,
    pub auth: String,
    pub user_agent: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl StoredSubscription {
    pub fn subscription_info(&self) -> SubscriptionInfo {
        SubscriptionInfo {
            endpoint: self.endpoint.clone(),
            keys: SubscriptionKeys {
                p256dh: self.p256dh.clone(),
                auth: self.auth.clone(),
            },
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_min_stock() -> i64 {
    5
}

fn default_frequency() -> Frequency {
    Frequency::Monthly
}
