use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    errors::AppError,
    storage::{models::StoredSession, traits::SessionStore},
};

pub struct PostgresSessionStore {
    pool: PgPool,
}

impl PostgresSessionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for PostgresSessionStore {
    async fn create_session(&self, session: &StoredSession) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO sessions (token, uid, user_agent, expires_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(session.token)
        .bind(&session.uid)
        .bind(&session.user_agent)
        .bind(session.expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn rotate_session(
        &self,
        old_token: &Uuid,
        new_token: &Uuid,
        user_agent: &str,
        expires_at: OffsetDateTime,
    ) -> Result<Option<String>, AppError> {
        let mut tx = self.pool.begin().await?;

        let uid: Option<String> = sqlx::query_scalar(
            r#"
            DELETE FROM sessions
            WHERE token = $1 AND expires_at > NOW()
            RETURNING uid
            "#,
        )
        .bind(old_token)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(uid) = uid else {
            // drop any expired row as well
            sqlx::query("DELETE FROM sessions WHERE token = $1")
                .bind(old_token)
                .execute(&mut *tx)
                .await?;
            tx.commit().await?;
            return Ok(None);
        };

        sqlx::query(
            r#"
            INSERT INTO sessions (token, uid, user_agent, expires_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(new_token)
        .bind(&uid)
        .bind(user_agent)
        .bind(expires_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(uid))
    }

    async fn delete_session(&self, token: &Uuid, uid: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM sessions WHERE token = $1 AND uid = $2")
            .bind(token)
            .bind(uid)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
