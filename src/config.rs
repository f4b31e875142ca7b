use crate::storage::{
    Storage, memory::memory_storage, postgres::connection::postgres_storage,
};
use anyhow::Context;
use sqlx::{PgPool, Postgres};
use std::{env::var, str::FromStr};
use time::{Date, OffsetDateTime, UtcOffset};
use tracing::{info, warn};

pub const DEFAULT_VAPID_KEY_PATH: &str = "./vapid_private.pem";
pub const DEFAULT_VAPID_SUBJECT: &str = "mailto:admin@piscinas-app.local";
// America/Guayaquil
pub const DEFAULT_UTC_OFFSET_HOURS: i8 = -5;

/// Credentials of the superuser created or reset at startup.
#[derive(Debug, Clone)]
pub struct AdminBootstrap {
    pub username: String,
    pub password: String,
    pub email: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub port: u16,
    pub listen_addr: String,
    pub storage_backend: String,
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub vapid_private_pem: Option<String>,
    pub vapid_key_path: String,
    pub vapid_subject: String,
    pub utc_offset: UtcOffset,
    pub admin: Option<AdminBootstrap>,
}

fn non_empty(name: &str) -> Option<String> {
    var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_or<T: FromStr + Copy + std::fmt::Display>(name: &str, default: T) -> T {
    match var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("Invalid {} value '{}', using {}", name, raw, default);
            default
        }),
        Err(_) => default,
    }
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        let jwt_secret = var("JWT_SECRET").context("JWT_SECRET not found in environment")?;

        let hours = parse_or("UTC_OFFSET_HOURS", DEFAULT_UTC_OFFSET_HOURS);
        let utc_offset = UtcOffset::from_hms(hours, 0, 0).unwrap_or_else(|_| {
            warn!("UTC_OFFSET_HOURS out of range: {}", hours);
            UtcOffset::from_hms(DEFAULT_UTC_OFFSET_HOURS, 0, 0).unwrap_or(UtcOffset::UTC)
        });

        let admin = match (non_empty("ADMIN_USER"), non_empty("ADMIN_PASSWORD")) {
            (Some(username), Some(password)) => Some(AdminBootstrap {
                username,
                password,
                email: non_empty("ADMIN_EMAIL"),
            }),
            _ => None,
        };

        Ok(Settings {
            port: parse_or("PORT", 3000),
            listen_addr: var("LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0".to_string()),
            storage_backend: var("STORAGE_BACKEND").unwrap_or_else(|_| "postgres".to_string()),
            database_url: non_empty("DATABASE_URL"),
            jwt_secret,
            vapid_private_pem: non_empty("VAPID_PRIVATE_PEM"),
            vapid_key_path: var("VAPID_KEY_PATH")
                .unwrap_or_else(|_| DEFAULT_VAPID_KEY_PATH.to_string()),
            vapid_subject: non_empty("VAPID_SUBJECT")
                .unwrap_or_else(|| DEFAULT_VAPID_SUBJECT.to_string()),
            utc_offset,
            admin,
        })
    }

    /// The current date in the business timezone.
    pub fn today(&self) -> Date {
        OffsetDateTime::now_utc().to_offset(self.utc_offset).date()
    }
}

pub async fn db_config(database_url: &str) -> anyhow::Result<sqlx::Pool<Postgres>> {
    let pool = PgPool::connect_lazy(database_url).context("Failed to connect to Postgres")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;
    Ok(pool)
}

pub async fn storage_config(settings: &Settings) -> anyhow::Result<Storage> {
    match settings.storage_backend.to_lowercase().as_str() {
        "postgres" => {
            info!("Using PostgreSQL storage backend");
            let database_url = settings
                .database_url
                .as_deref()
                .context("DATABASE_URL not found in environment")?;
            let pool = db_config(database_url).await?;
            Ok(postgres_storage(pool))
        }
        "memory" => {
            info!("Using in-memory storage backend");
            Ok(memory_storage())
        }
        _ => {
            anyhow::bail!(
                "Invalid STORAGE_BACKEND: '{}'. Valid options are 'postgres' and 'memory'",
                settings.storage_backend
            )
        }
    }
}
