use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};
use web_push::SubscriptionInfo;

use crate::{
    errors::AppError,
    storage::{models::StoredSubscription, traits::NotificationStore},
};

const SUBSCRIPTION_COLUMNS: &str = "id, uid, endpoint, p256dh, auth, user_agent, created_at";

pub struct PostgresNotificationStore {
    pool: PgPool,
}

impl PostgresNotificationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn subscription_from_row(row: &PgRow) -> Result<StoredSubscription, sqlx::Error> {
    Ok(StoredSubscription {
        id: row.try_get("id")?,
        uid: row.try_get("uid")?,
        endpoint: row.try_get("endpoint")?,
        p256dh: row.try_get("p256dh")?,
        auth: row.try_get("auth")?,
        user_agent: row.try_get("user_agent")?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl NotificationStore for PostgresNotificationStore {
    async fn upsert_subscription(
        &self,
        uid: &str,
        subscription: &SubscriptionInfo,
        user_agent: Option<&str>,
    ) -> Result<(StoredSubscription, bool), AppError> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO push_subscriptions (uid, endpoint, p256dh, auth, user_agent)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (endpoint)
            DO UPDATE SET
                uid = EXCLUDED.uid, p256dh = EXCLUDED.p256dh,
                auth = EXCLUDED.auth, user_agent = EXCLUDED.user_agent
            RETURNING {}, (xmax = 0) AS created
            "#,
            SUBSCRIPTION_COLUMNS
        ))
        .bind(uid)
        .bind(&subscription.endpoint)
        .bind(&subscription.keys.p256dh)
        .bind(&subscription.keys.auth)
        .bind(user_agent)
        .fetch_one(&self.pool)
        .await?;

        let created: bool = row.try_get("created")?;
        Ok((subscription_from_row(&row)?, created))
    }

    async fn subscriptions_for(
        &self,
        uids: &[String],
    ) -> Result<Vec<StoredSubscription>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM push_subscriptions WHERE uid = ANY($1) ORDER BY id",
            SUBSCRIPTION_COLUMNS
        ))
        .bind(uids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(subscription_from_row)
            .collect::<Result<Vec<_>, _>>()?)
    }

    async fn delete_endpoint(&self, endpoint: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM push_subscriptions WHERE endpoint = $1")
            .bind(endpoint)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_user_endpoint(&self, uid: &str, endpoint: &str) -> Result<bool, AppError> {
        let result =
            sqlx::query("DELETE FROM push_subscriptions WHERE uid = $1 AND endpoint = $2")
                .bind(uid)
                .bind(endpoint)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }
}
