use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::{
    errors::AppError,
    storage::{
        models::{Supply, SupplyInput},
        traits::SupplyStore,
    },
};

pub struct PostgresSupplyStore {
    pool: PgPool,
}

impl PostgresSupplyStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

pub(crate) fn supply_from_row(row: &PgRow) -> Result<Supply, sqlx::Error> {
    Ok(Supply {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        stock: row.try_get("stock")?,
        min_stock: row.try_get("min_stock")?,
        price_cents: row.try_get("price_cents")?,
    })
}

#[async_trait]
impl SupplyStore for PostgresSupplyStore {
    async fn list_supplies(&self, low_stock_only: bool) -> Result<Vec<Supply>, AppError> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, stock, min_stock, price_cents
            FROM supplies
            WHERE NOT $1 OR stock <= min_stock
            ORDER BY name, id
            "#,
        )
        .bind(low_stock_only)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(supply_from_row)
            .collect::<Result<Vec<_>, _>>()?)
    }

    async fn get_supply(&self, id: i64) -> Result<Option<Supply>, AppError> {
        let row = sqlx::query(
            "SELECT id, name, stock, min_stock, price_cents FROM supplies WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(supply_from_row).transpose()?)
    }

    async fn create_supply(&self, input: &SupplyInput) -> Result<Supply, AppError> {
        let row = sqlx::query(
            r#"
            INSERT INTO supplies (name, stock, min_stock, price_cents)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, stock, min_stock, price_cents
            "#,
        )
        .bind(&input.name)
        .bind(input.stock)
        .bind(input.min_stock)
        .bind(input.price_cents)
        .fetch_one(&self.pool)
        .await?;

        Ok(supply_from_row(&row)?)
    }

    async fn update_supply(
        &self,
        id: i64,
        input: &SupplyInput,
    ) -> Result<Option<Supply>, AppError> {
        let row = sqlx::query(
            r#"
            UPDATE supplies
            SET name = $2, stock = $3, min_stock = $4, price_cents = $5
            WHERE id = $1
            RETURNING id, name, stock, min_stock, price_cents
            "#,
        )
        .bind(id)
        .bind(&input.name)
        .bind(input.stock)
        .bind(input.min_stock)
        .bind(input.price_cents)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(supply_from_row).transpose()?)
    }

    async fn delete_supply(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM supplies WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::from_sqlx(e, "Supply is referenced by expenses"))?;

        Ok(result.rows_affected() > 0)
    }
}
