pub mod handlers;
pub mod ledger;
pub mod service;

pub use handlers::{
    create_supply_handler, delete_expense_handler, delete_supply_handler, delete_usage_handler,
    get_supply_handler, list_supplies_handler, record_usage_handler, update_supply_handler,
    update_usage_handler,
};
pub use ledger::LedgerService;
pub use service::SupplyService;
