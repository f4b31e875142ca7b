pub mod handlers;
pub mod pwa;
pub mod service;

pub use handlers::{dashboard_handler, home_handler, offline_handler, operations_handler};
pub use pwa::{healthz_handler, manifest_handler, root_handler};
pub use service::{DashboardService, OperationsBoard, View};
