pub mod handlers;
pub mod recurring;
pub mod service;

pub use handlers::{
    create_income_handler, create_recurring_handler, delete_income_handler,
    delete_recurring_handler, get_income_handler, get_recurring_handler, list_expenses_handler,
    list_incomes_handler, list_recurring_handler, summary_handler, update_income_handler,
    update_recurring_handler,
};
pub use service::{FinanceService, FinanceSummary};
