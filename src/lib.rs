pub mod auth;
pub mod clients;
pub mod config;
pub mod contracts;
pub mod dashboard;
pub mod errors;
pub mod finance;
pub mod inventory;
pub mod maintenance;
pub mod middleware;
pub mod notifications;
pub mod storage;
pub mod workers;

use crate::{
    auth::{SessionManager, bootstrap_admin},
    config::{Settings, storage_config},
    middleware::auth_middleware,
    notifications::{HyperPushSender, NotificationService, PushSender, VapidKeys},
    storage::Storage,
};
use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{delete, get, patch, post, put},
};
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub storage: Arc<Storage>,
    pub sessions: Arc<SessionManager>,
    pub notification_service: Arc<NotificationService>,
}

impl AppState {
    pub async fn new(
        settings: Settings,
        storage: Storage,
        sender: Arc<dyn PushSender>,
    ) -> anyhow::Result<Self> {
        let storage = Arc::new(storage);
        let sessions = Arc::new(SessionManager::new(&settings.jwt_secret, storage.clone()));
        let keys = VapidKeys::load(&settings).await?;
        let notification_service = NotificationService::new(
            storage.clone(),
            sender,
            &keys,
            &settings.vapid_subject,
        )?;

        Ok(AppState {
            settings: Arc::new(settings),
            storage,
            sessions,
            notification_service: Arc::new(notification_service),
        })
    }
}

pub fn app(app_state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/auth/logout", post(auth::logout_handler))
        .route("/auth/me", get(auth::me_handler))
        .route(
            "/api/users",
            get(auth::list_users_handler).post(auth::create_user_handler),
        )
        .route(
            "/api/clients",
            get(clients::list_clients_handler).post(clients::create_client_handler),
        )
        .route(
            "/api/clients/{id}",
            get(clients::get_client_handler)
                .put(clients::update_client_handler)
                .delete(clients::delete_client_handler),
        )
        .route(
            "/api/contracts",
            get(contracts::list_contracts_handler).post(contracts::create_contract_handler),
        )
        .route(
            "/api/contracts/{id}",
            get(contracts::get_contract_handler)
                .put(contracts::update_contract_handler)
                .delete(contracts::delete_contract_handler),
        )
        .route(
            "/api/contracts/{id}/checklist",
            get(contracts::list_templates_handler).post(contracts::add_template_handler),
        )
        .route(
            "/api/checklist-templates/{id}",
            delete(contracts::delete_template_handler),
        )
        .route(
            "/api/workers",
            get(workers::list_workers_handler).post(workers::create_worker_handler),
        )
        .route(
            "/api/workers/{id}",
            get(workers::get_worker_handler)
                .put(workers::update_worker_handler)
                .delete(workers::delete_worker_handler),
        )
        .route(
            "/api/supplies",
            get(inventory::list_supplies_handler).post(inventory::create_supply_handler),
        )
        .route(
            "/api/supplies/{id}",
            get(inventory::get_supply_handler)
                .put(inventory::update_supply_handler)
                .delete(inventory::delete_supply_handler),
        )
        .route(
            "/api/maintenances",
            get(maintenance::list_maintenances_handler)
                .post(maintenance::create_maintenance_handler),
        )
        .route(
            "/api/maintenances/{id}",
            get(maintenance::get_maintenance_handler)
                .put(maintenance::update_maintenance_handler)
                .delete(maintenance::delete_maintenance_handler),
        )
        .route(
            "/api/maintenances/{id}/complete",
            post(maintenance::complete_maintenance_handler),
        )
        .route(
            "/api/maintenances/{id}/checklist",
            post(maintenance::add_checklist_item_handler),
        )
        .route(
            "/api/maintenances/{id}/usages",
            post(inventory::record_usage_handler),
        )
        .route(
            "/api/checklist/{id}",
            patch(maintenance::update_checklist_item_handler),
        )
        .route(
            "/api/usages/{id}",
            put(inventory::update_usage_handler).delete(inventory::delete_usage_handler),
        )
        .route("/api/expenses", get(finance::list_expenses_handler))
        .route("/api/expenses/{id}", delete(inventory::delete_expense_handler))
        .route(
            "/api/incomes",
            get(finance::list_incomes_handler).post(finance::create_income_handler),
        )
        .route(
            "/api/incomes/{id}",
            get(finance::get_income_handler)
                .put(finance::update_income_handler)
                .delete(finance::delete_income_handler),
        )
        .route(
            "/api/recurring",
            get(finance::list_recurring_handler).post(finance::create_recurring_handler),
        )
        .route(
            "/api/recurring/{id}",
            get(finance::get_recurring_handler)
                .put(finance::update_recurring_handler)
                .delete(finance::delete_recurring_handler),
        )
        .route("/api/finance/summary", get(finance::summary_handler))
        .route("/dashboard", get(dashboard::dashboard_handler))
        .route("/dashboard/", get(dashboard::dashboard_handler))
        .route("/dashboard/home", get(dashboard::home_handler))
        .route("/dashboard/operations", get(dashboard::operations_handler))
        .route("/dashboard/offline", get(dashboard::offline_handler))
        .route(
            "/dashboard/push/subscribe",
            post(notifications::subscribe_handler),
        )
        .route(
            "/dashboard/push/unsubscribe",
            post(notifications::unsubscribe_handler),
        )
        .route("/dashboard/push/test", post(notifications::test_handler))
        .route("/dashboard/push/send", post(notifications::send_handler))
        .route_layer(from_fn_with_state(app_state.clone(), auth_middleware));

    Router::new()
        .route("/", get(dashboard::root_handler))
        .route("/healthz", get(dashboard::healthz_handler))
        .route("/healthz/", get(dashboard::healthz_handler))
        .route("/dashboard/manifest.json", get(dashboard::manifest_handler))
        .route(
            "/dashboard/push/public-key",
            get(notifications::public_key_handler),
        )
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/refresh", post(auth::refresh_handler))
        .merge(protected_routes)
        .with_state(app_state)
}

pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
}

pub async fn run(settings: Settings) -> anyhow::Result<()> {
    let storage = storage_config(&settings).await?;
    bootstrap_admin(&storage, settings.admin.as_ref())
        .await
        .map_err(|e| anyhow::anyhow!("Admin bootstrap failed: {:?}", e))?;

    let addr: SocketAddr = format!("{}:{}", settings.listen_addr, settings.port).parse()?;
    let app_state = AppState::new(settings, storage, Arc::new(HyperPushSender::new())).await?;
    let app = app(app_state);

    info!("Server listening on http://{}", addr);

    let listener = TcpListener::bind(addr).await?;

    axum::serve(listener, app).await?;

    Ok(())
}
