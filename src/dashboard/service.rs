use std::collections::HashMap;

use serde::Serialize;
use time::{Date, Duration, macros::format_description};

use crate::{
    AppState,
    auth::Claims,
    errors::AppError,
    storage::models::{Cents, DateRange, Maintenance, MaintenanceQuery, MaintenanceStatus, Worker},
    workers::WorkerService,
};

pub const UPCOMING_LIMIT: usize = 30;
pub const WORKER_UPCOMING_LIMIT: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    Admin,
    Worker,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminDashboard {
    pub total_income_cents: Cents,
    pub total_expenses_cents: Cents,
    pub balance_cents: Cents,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerDashboard {
    pub today: Date,
    pub worker: Option<Worker>,
    pub todays: Vec<Maintenance>,
    pub upcoming: Vec<Maintenance>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "view", rename_all = "lowercase")]
pub enum Dashboard {
    Admin(AdminDashboard),
    Worker(WorkerDashboard),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerLoad {
    pub worker_id: i64,
    pub username: String,
    pub day: usize,
    pub overdue: usize,
    pub upcoming: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationsBoard {
    pub target: Date,
    pub today: Date,
    pub day: Vec<Maintenance>,
    pub overdue: Vec<Maintenance>,
    pub upcoming: Vec<Maintenance>,
    pub workers: Vec<WorkerLoad>,
}

/// `manana` is tomorrow, `semana` today; otherwise an explicit
/// `YYYY-MM-DD` date, falling back to today.
pub fn target_date(mode: Option<&str>, date: Option<&str>, today: Date) -> Date {
    match mode.map(str::trim) {
        Some("manana") => today + Duration::days(1),
        Some("semana") => today,
        _ => date
            .and_then(|d| Date::parse(d.trim(), format_description!("[year]-[month]-[day]")).ok())
            .unwrap_or(today),
    }
}

/// Builds the board from the visits on the target day, the pending ones
/// before today and the pending ones after today. Every worker in `assigned`
/// gets a load row, even when all of its visits fall outside those lists.
pub fn operations_board(
    target: Date,
    today: Date,
    mut day: Vec<Maintenance>,
    mut overdue: Vec<Maintenance>,
    mut upcoming: Vec<Maintenance>,
    workers: &[Worker],
    assigned: &[i64],
) -> OperationsBoard {
    day.sort_by_key(|m| (m.status, m.date, m.id));
    overdue.sort_by_key(|m| (m.date, m.id));
    upcoming.sort_by_key(|m| (m.date, m.id));

    let names: HashMap<i64, &str> = workers
        .iter()
        .map(|w| (w.id, w.username.as_str()))
        .collect();
    let empty_load = |worker_id: i64| WorkerLoad {
        worker_id,
        username: names.get(&worker_id).copied().unwrap_or_default().to_string(),
        day: 0,
        overdue: 0,
        upcoming: 0,
    };
    let mut loads: HashMap<i64, WorkerLoad> = assigned
        .iter()
        .map(|id| (*id, empty_load(*id)))
        .collect();
    let mut count = |list: &[Maintenance], bump: fn(&mut WorkerLoad)| {
        for maintenance in list {
            for worker_id in &maintenance.worker_ids {
                let load = loads
                    .entry(*worker_id)
                    .or_insert_with(|| empty_load(*worker_id));
                bump(load);
            }
        }
    };
    count(&day, |l| l.day += 1);
    count(&overdue, |l| l.overdue += 1);
    count(&upcoming, |l| l.upcoming += 1);

    let mut workers: Vec<WorkerLoad> = loads.into_values().collect();
    workers.sort_by(|a, b| {
        b.overdue
            .cmp(&a.overdue)
            .then(b.day.cmp(&a.day))
            .then(b.upcoming.cmp(&a.upcoming))
            .then(a.username.cmp(&b.username))
            .then(a.worker_id.cmp(&b.worker_id))
    });

    upcoming.truncate(UPCOMING_LIMIT);
    OperationsBoard {
        target,
        today,
        day,
        overdue,
        upcoming,
        workers,
    }
}

pub struct DashboardService;

impl DashboardService {
    pub fn view(claims: &Claims) -> Result<View, AppError> {
        if claims.is_admin() {
            Ok(View::Admin)
        } else if claims.is_worker() {
            Ok(View::Worker)
        } else {
            Err(AppError::Forbidden("No dashboard for this account".to_string()))
        }
    }

    pub async fn dashboard(state: &AppState, claims: &Claims) -> Result<Dashboard, AppError> {
        match Self::view(claims)? {
            View::Admin => {
                let total_income_cents = state.storage.contracts.active_monthly_total().await?;
                let total_expenses_cents = state
                    .storage
                    .ledger
                    .expenses_total(&DateRange::default())
                    .await?;
                Ok(Dashboard::Admin(AdminDashboard {
                    total_income_cents,
                    total_expenses_cents,
                    balance_cents: total_income_cents - total_expenses_cents,
                }))
            }
            View::Worker => {
                let today = state.settings.today();
                let Some(worker) = WorkerService::for_user(state, &claims.sub).await? else {
                    return Ok(Dashboard::Worker(WorkerDashboard {
                        today,
                        worker: None,
                        todays: Vec::new(),
                        upcoming: Vec::new(),
                    }));
                };

                let maintenances = &state.storage.maintenances;
                let todays = maintenances
                    .list_maintenances(&MaintenanceQuery {
                        on: Some(today),
                        worker_id: Some(worker.id),
                        ..MaintenanceQuery::default()
                    })
                    .await?;
                let upcoming = maintenances
                    .list_maintenances(&MaintenanceQuery {
                        after: Some(today),
                        worker_id: Some(worker.id),
                        limit: Some(WORKER_UPCOMING_LIMIT),
                        ..MaintenanceQuery::default()
                    })
                    .await?;
                Ok(Dashboard::Worker(WorkerDashboard {
                    today,
                    worker: Some(worker),
                    todays,
                    upcoming,
                }))
            }
        }
    }

    pub async fn operations(
        state: &AppState,
        mode: Option<&str>,
        date: Option<&str>,
    ) -> Result<OperationsBoard, AppError> {
        let today = state.settings.today();
        let target = target_date(mode, date, today);
        let maintenances = &state.storage.maintenances;

        let day = maintenances
            .list_maintenances(&MaintenanceQuery {
                on: Some(target),
                ..MaintenanceQuery::default()
            })
            .await?;
        let overdue = maintenances
            .list_maintenances(&MaintenanceQuery {
                before: Some(today),
                status: Some(MaintenanceStatus::Pending),
                ..MaintenanceQuery::default()
            })
            .await?;
        let upcoming = maintenances
            .list_maintenances(&MaintenanceQuery {
                after: Some(today),
                status: Some(MaintenanceStatus::Pending),
                ..MaintenanceQuery::default()
            })
            .await?;
        let workers = state.storage.workers.list_workers().await?;
        let assigned = maintenances.assigned_worker_ids().await?;

        Ok(operations_board(
            target, today, day, overdue, upcoming, &workers, &assigned,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn visit(id: i64, date: Date, status: MaintenanceStatus, workers: &[i64]) -> Maintenance {
        Maintenance {
            id,
            client_id: 1,
            contract_id: 1,
            date,
            worker_ids: workers.to_vec(),
            status,
            notes: String::new(),
        }
    }

    fn worker(id: i64, username: &str) -> Worker {
        Worker {
            id,
            uid: format!("uid-{}", id),
            username: username.to_string(),
            phone: String::new(),
            active: true,
        }
    }

    #[test]
    fn target_date_modes() {
        let today = date!(2024 - 06 - 30);
        assert_eq!(target_date(Some("manana"), None, today), date!(2024 - 07 - 01));
        assert_eq!(
            target_date(Some("semana"), Some("2024-01-01"), today),
            today
        );
        assert_eq!(
            target_date(None, Some("2024-01-05"), today),
            date!(2024 - 01 - 05)
        );
        assert_eq!(target_date(None, Some("05/01/2024"), today), today);
        assert_eq!(target_date(Some("otro"), None, today), today);
    }

    #[test]
    fn day_list_puts_pending_first() {
        let target = date!(2024 - 06 - 10);
        let day = vec![
            visit(1, target, MaintenanceStatus::Done, &[]),
            visit(3, target, MaintenanceStatus::Pending, &[]),
            visit(2, target, MaintenanceStatus::Pending, &[]),
        ];
        let board = operations_board(target, target, day, Vec::new(), Vec::new(), &[], &[]);
        let ids: Vec<i64> = board.day.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[test]
    fn upcoming_is_capped_but_counted_in_full() {
        let today = date!(2024 - 06 - 10);
        let upcoming: Vec<Maintenance> = (0..35)
            .map(|i| {
                visit(
                    i,
                    today + Duration::days(i + 1),
                    MaintenanceStatus::Pending,
                    &[7],
                )
            })
            .collect();
        let board = operations_board(
            today,
            today,
            Vec::new(),
            Vec::new(),
            upcoming,
            &[worker(7, "luis")],
            &[7],
        );
        assert_eq!(board.upcoming.len(), UPCOMING_LIMIT);
        assert_eq!(board.workers[0].upcoming, 35);
        assert_eq!(board.workers[0].username, "luis");
    }

    #[test]
    fn worker_load_sorts_by_overdue_then_day_then_upcoming() {
        let today = date!(2024 - 06 - 10);
        let past = date!(2024 - 06 - 01);
        let future = date!(2024 - 06 - 20);
        let day = vec![
            visit(1, today, MaintenanceStatus::Pending, &[1, 2]),
            visit(2, today, MaintenanceStatus::Done, &[2]),
        ];
        let overdue = vec![visit(3, past, MaintenanceStatus::Pending, &[3])];
        let upcoming = vec![visit(4, future, MaintenanceStatus::Pending, &[1])];
        let workers = [worker(1, "ana"), worker(2, "beto"), worker(3, "carla")];

        let board = operations_board(
            today,
            today,
            day,
            overdue,
            upcoming,
            &workers,
            &[1, 2, 3],
        );
        let order: Vec<&str> = board.workers.iter().map(|w| w.username.as_str()).collect();
        assert_eq!(order, vec!["carla", "beto", "ana"]);
        assert_eq!(
            board.workers[1],
            WorkerLoad {
                worker_id: 2,
                username: "beto".to_string(),
                day: 2,
                overdue: 0,
                upcoming: 0,
            }
        );
    }

    #[test]
    fn assigned_workers_without_open_visits_get_empty_loads() {
        let today = date!(2024 - 06 - 10);
        let upcoming = vec![visit(
            1,
            date!(2024 - 06 - 12),
            MaintenanceStatus::Pending,
            &[1],
        )];
        let workers = [worker(1, "ana"), worker(2, "beto")];

        let board = operations_board(
            today,
            today,
            Vec::new(),
            Vec::new(),
            upcoming,
            &workers,
            &[1, 2],
        );
        assert_eq!(board.workers.len(), 2);
        assert_eq!(
            board.workers[1],
            WorkerLoad {
                worker_id: 2,
                username: "beto".to_string(),
                day: 0,
                overdue: 0,
                upcoming: 0,
            }
        );
    }
}
