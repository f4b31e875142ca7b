pub mod handler;
pub mod sender;
pub mod service;
pub mod vapid;
pub use handler::{
    public_key_handler, send_handler, subscribe_handler, test_handler, unsubscribe_handler,
};
pub use sender::{HyperPushSender, PushFailure, PushSender};
pub use service::{DispatchReport, NotificationPayload, NotificationService};
pub use vapid::VapidKeys;
