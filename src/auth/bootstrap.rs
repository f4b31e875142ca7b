use tracing::info;
use uuid::Uuid;

use crate::{
    auth::local::hash_password,
    config::AdminBootstrap,
    errors::AppError,
    storage::{Storage, models::NewUser},
};

/// Creates the configured superuser, or resets its password, flag and email
/// when it already exists.
pub async fn bootstrap_admin(
    storage: &Storage,
    admin: Option<&AdminBootstrap>,
) -> Result<(), AppError> {
    let Some(admin) = admin else {
        info!("ADMIN_USER/ADMIN_PASSWORD not set, skipping admin bootstrap");
        return Ok(());
    };

    let password_hash = hash_password(&admin.password)?;
    match storage.users.get_user_by_username(&admin.username).await? {
        Some(existing) => {
            storage
                .users
                .reset_superuser(&existing.uid, &password_hash, admin.email.as_deref())
                .await?;
            info!("Superuser {} updated", admin.username);
        }
        None => {
            storage
                .users
                .create_user(&NewUser {
                    uid: Uuid::new_v4().to_string(),
                    username: admin.username.clone(),
                    email: admin.email.clone(),
                    password_hash,
                    is_superuser: true,
                    groups: Vec::new(),
                })
                .await?;
            info!("Superuser {} created", admin.username);
        }
    }
    Ok(())
}
