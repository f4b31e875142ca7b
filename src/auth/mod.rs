pub mod bootstrap;
pub mod handlers;
pub mod jwt;
pub mod local;
pub mod roles;
pub mod session;
pub mod types;

pub use bootstrap::bootstrap_admin;
pub use handlers::{
    create_user_handler, list_users_handler, login_handler, logout_handler, me_handler,
    refresh_handler,
};
pub use jwt::{Claims, JwtHelper};
pub use roles::{Role, is_admin, is_worker};
pub use session::{JWT_LIFESPAN, REFRESH_EXPIRATION, SessionManager};
