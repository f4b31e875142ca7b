pub mod handlers;
pub mod service;

pub use handlers::{
    add_checklist_item_handler, complete_maintenance_handler, create_maintenance_handler,
    delete_maintenance_handler, get_maintenance_handler, list_maintenances_handler,
    update_checklist_item_handler, update_maintenance_handler,
};
pub use service::{MaintenanceChanges, MaintenanceDetail, MaintenanceService};
