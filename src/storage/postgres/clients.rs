use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder, Row, postgres::PgRow};

use crate::{
    errors::AppError,
    storage::{
        models::{Client, ClientInput, ClientQuery},
        postgres::restore_stock,
        traits::ClientStore,
    },
};

const CLIENT_COLUMNS: &str = "id, name, phone, email, address, active, registered_at";

pub struct PostgresClientStore {
    pool: PgPool,
}

impl PostgresClientStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn client_from_row(row: &PgRow) -> Result<Client, sqlx::Error> {
    Ok(Client {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        phone: row.try_get("phone")?,
        email: row.try_get("email")?,
        address: row.try_get("address")?,
        active: row.try_get("active")?,
        registered_at: row.try_get("registered_at")?,
    })
}

#[async_trait]
impl ClientStore for PostgresClientStore {
    async fn list_clients(&self, query: &ClientQuery) -> Result<Vec<Client>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {} FROM clients WHERE TRUE",
            CLIENT_COLUMNS
        ));
        if let Some(active) = query.active {
            qb.push(" AND active = ").push_bind(active);
        }
        if let Some(search) = &query.search {
            let needle = search.to_lowercase();
            qb.push(" AND (strpos(lower(name), ")
                .push_bind(needle.clone())
                .push(") > 0 OR strpos(lower(phone), ")
                .push_bind(needle)
                .push(") > 0)");
        }
        qb.push(" ORDER BY name, id");

        let rows = qb.build().fetch_all(&self.pool).await?;
        Ok(rows
            .iter()
            .map(client_from_row)
            .collect::<Result<Vec<_>, _>>()?)
    }

    async fn get_client(&self, id: i64) -> Result<Option<Client>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM clients WHERE id = $1",
            CLIENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(client_from_row).transpose()?)
    }

    async fn create_client(&self, input: &ClientInput) -> Result<Client, AppError> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO clients (name, phone, email, address, active)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            CLIENT_COLUMNS
        ))
        .bind(&input.name)
        .bind(&input.phone)
        .bind(&input.email)
        .bind(&input.address)
        .bind(input.active)
        .fetch_one(&self.pool)
        .await?;

        Ok(client_from_row(&row)?)
    }

    async fn update_client(
        &self,
        id: i64,
        input: &ClientInput,
    ) -> Result<Option<Client>, AppError> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE clients
            SET name = $2, phone = $3, email = $4, address = $5, active = $6
            WHERE id = $1
            RETURNING {}
            "#,
            CLIENT_COLUMNS
        ))
        .bind(id)
        .bind(&input.name)
        .bind(&input.phone)
        .bind(&input.email)
        .bind(&input.address)
        .bind(input.active)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(client_from_row).transpose()?)
    }

    async fn delete_client(&self, id: i64) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;

        restore_stock(
            &mut tx,
            "SELECT id FROM maintenances WHERE client_id = $1 \
             OR contract_id IN (SELECT id FROM contracts WHERE client_id = $1)",
            id,
        )
        .await?;

        let result = sqlx::query("DELETE FROM clients WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::from_sqlx(e, "Client is referenced by incomes"))?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }
}
