pub mod handlers;
pub mod service;

pub use handlers::{
    create_client_handler, delete_client_handler, get_client_handler, list_clients_handler,
    update_client_handler,
};
pub use service::ClientService;
