pub mod handlers;
pub mod service;

pub use handlers::{
    create_worker_handler, delete_worker_handler, get_worker_handler, list_workers_handler,
    update_worker_handler,
};
pub use service::WorkerService;
