pub mod handlers;
pub mod service;

pub use handlers::{
    add_template_handler, create_contract_handler, delete_contract_handler,
    delete_template_handler, get_contract_handler, list_contracts_handler, list_templates_handler,
    update_contract_handler,
};
pub use service::ContractService;
