use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::{
    errors::AppError,
    storage::{
        models::{NewUser, Worker},
        postgres::users::insert_user,
        traits::WorkerStore,
    },
};

const SELECT_WORKER: &str = r#"
    SELECT w.id, w.uid, u.username, w.phone, w.active
    FROM workers w
    JOIN users u ON u.uid = w.uid
"#;

pub struct PostgresWorkerStore {
    pool: PgPool,
}

impl PostgresWorkerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_one_where(&self, clause: &str, id: i64) -> Result<Option<Worker>, AppError> {
        let row = sqlx::query(&format!("{} WHERE {}", SELECT_WORKER, clause))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(worker_from_row).transpose()?)
    }
}

fn worker_from_row(row: &PgRow) -> Result<Worker, sqlx::Error> {
    Ok(Worker {
        id: row.try_get("id")?,
        uid: row.try_get("uid")?,
        username: row.try_get("username")?,
        phone: row.try_get("phone")?,
        active: row.try_get("active")?,
    })
}

#[async_trait]
impl WorkerStore for PostgresWorkerStore {
    async fn list_workers(&self) -> Result<Vec<Worker>, AppError> {
        let rows = sqlx::query(&format!("{} ORDER BY u.username", SELECT_WORKER))
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .iter()
            .map(worker_from_row)
            .collect::<Result<Vec<_>, _>>()?)
    }

    async fn get_worker(&self, id: i64) -> Result<Option<Worker>, AppError> {
        self.fetch_one_where("w.id = $1", id).await
    }

    async fn get_worker_by_uid(&self, uid: &str) -> Result<Option<Worker>, AppError> {
        let row = sqlx::query(&format!("{} WHERE w.uid = $1", SELECT_WORKER))
            .bind(uid)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(worker_from_row).transpose()?)
    }

    async fn create_worker(&self, user: &NewUser, phone: &str) -> Result<Worker, AppError> {
        let mut tx = self.pool.begin().await?;

        let stored = insert_user(&mut tx, user).await?;
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO workers (uid, phone)
            VALUES ($1, $2)
            RETURNING id
            "#,
        )
        .bind(&stored.uid)
        .bind(phone)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::from_sqlx(e, "User already has a worker profile"))?;

        tx.commit().await?;
        Ok(Worker {
            id,
            uid: stored.uid,
            username: stored.username,
            phone: phone.to_string(),
            active: true,
        })
    }

    async fn update_worker(
        &self,
        id: i64,
        phone: &str,
        active: bool,
    ) -> Result<Option<Worker>, AppError> {
        let result = sqlx::query("UPDATE workers SET phone = $2, active = $3 WHERE id = $1")
            .bind(id)
            .bind(phone)
            .bind(active)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_worker(id).await
    }

    async fn delete_worker(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM workers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
