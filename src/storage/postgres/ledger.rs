use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder, Row, postgres::PgRow};
use time::Date;

use crate::{
    errors::AppError,
    storage::{
        models::{Cents, DateRange, Expense, ExpenseQuery, SupplyUsage, line_total},
        postgres::supplies::supply_from_row,
        traits::LedgerStore,
    },
};

const EXPENSE_COLUMNS: &str =
    "id, maintenance_id, supply_id, quantity, unit_cost_cents, total_cents, date";

pub struct PostgresLedgerStore {
    pool: PgPool,
}

impl PostgresLedgerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn usage_from_row(row: &PgRow) -> Result<SupplyUsage, sqlx::Error> {
    Ok(SupplyUsage {
        id: row.try_get("id")?,
        maintenance_id: row.try_get("maintenance_id")?,
        supply_id: row.try_get("supply_id")?,
        quantity: row.try_get("quantity")?,
        expense_id: row.try_get("expense_id")?,
    })
}

fn expense_from_row(row: &PgRow) -> Result<Expense, sqlx::Error> {
    Ok(Expense {
        id: row.try_get("id")?,
        maintenance_id: row.try_get("maintenance_id")?,
        supply_id: row.try_get("supply_id")?,
        quantity: row.try_get("quantity")?,
        unit_cost_cents: row.try_get("unit_cost_cents")?,
        total_cents: row.try_get("total_cents")?,
        date: row.try_get("date")?,
    })
}

#[async_trait]
impl LedgerStore for PostgresLedgerStore {
    async fn record_usage(
        &self,
        maintenance_id: i64,
        supply_id: i64,
        quantity: i64,
        date: Date,
    ) -> Result<SupplyUsage, AppError> {
        let mut tx = self.pool.begin().await?;

        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM maintenances WHERE id = $1)")
                .bind(maintenance_id)
                .fetch_one(&mut *tx)
                .await?;
        if !exists {
            return Err(AppError::NotFound("Maintenance not found".to_string()));
        }

        let row = sqlx::query(
            r#"
            SELECT id, name, stock, min_stock, price_cents
            FROM supplies
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(supply_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Supply not found".to_string()))?;
        let supply = supply_from_row(&row)?;

        if supply.stock < quantity {
            return Err(AppError::Conflict(format!(
                "Insufficient stock for {}",
                supply.name
            )));
        }

        let total_cents = line_total(quantity, supply.price_cents)?;

        sqlx::query("UPDATE supplies SET stock = stock - $2 WHERE id = $1")
            .bind(supply_id)
            .bind(quantity)
            .execute(&mut *tx)
            .await?;

        let expense_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO expenses (maintenance_id, supply_id, quantity, unit_cost_cents, total_cents, date)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(maintenance_id)
        .bind(supply_id)
        .bind(quantity)
        .bind(supply.price_cents)
        .bind(total_cents)
        .bind(date)
        .fetch_one(&mut *tx)
        .await?;

        let row = sqlx::query(
            r#"
            INSERT INTO supply_usages (maintenance_id, supply_id, quantity, expense_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, maintenance_id, supply_id, quantity, expense_id
            "#,
        )
        .bind(maintenance_id)
        .bind(supply_id)
        .bind(quantity)
        .bind(expense_id)
        .fetch_one(&mut *tx)
        .await?;
        let usage = usage_from_row(&row)?;

        tx.commit().await?;
        Ok(usage)
    }

    async fn update_usage(&self, id: i64, quantity: i64) -> Result<SupplyUsage, AppError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            r#"
            SELECT id, maintenance_id, supply_id, quantity, expense_id
            FROM supply_usages
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Usage not found".to_string()))?;
        let usage = usage_from_row(&row)?;
        let delta = quantity - usage.quantity;

        let row = sqlx::query(
            "SELECT id, name, stock, min_stock, price_cents FROM supplies WHERE id = $1 FOR UPDATE",
        )
        .bind(usage.supply_id)
        .fetch_one(&mut *tx)
        .await?;
        let supply = supply_from_row(&row)?;
        if delta > 0 && supply.stock < delta {
            return Err(AppError::Conflict(format!(
                "Insufficient stock for {}",
                supply.name
            )));
        }

        sqlx::query("UPDATE supplies SET stock = stock - $2 WHERE id = $1")
            .bind(usage.supply_id)
            .bind(delta)
            .execute(&mut *tx)
            .await?;

        let unit_cost_cents: Cents =
            sqlx::query_scalar("SELECT unit_cost_cents FROM expenses WHERE id = $1 FOR UPDATE")
                .bind(usage.expense_id)
                .fetch_one(&mut *tx)
                .await?;

        sqlx::query("UPDATE expenses SET quantity = $2, total_cents = $3 WHERE id = $1")
            .bind(usage.expense_id)
            .bind(quantity)
            .bind(line_total(quantity, unit_cost_cents)?)
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE supply_usages SET quantity = $2 WHERE id = $1")
            .bind(id)
            .bind(quantity)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(SupplyUsage { quantity, ..usage })
    }

    async fn delete_usage(&self, id: i64) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            "DELETE FROM supply_usages WHERE id = $1 RETURNING id, maintenance_id, supply_id, quantity, expense_id",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(row) = row else {
            return Ok(false);
        };
        let usage = usage_from_row(&row)?;

        sqlx::query("UPDATE supplies SET stock = stock + $2 WHERE id = $1")
            .bind(usage.supply_id)
            .bind(usage.quantity)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM expenses WHERE id = $1")
            .bind(usage.expense_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(true)
    }

    async fn get_usage(&self, id: i64) -> Result<Option<SupplyUsage>, AppError> {
        let row = sqlx::query(
            "SELECT id, maintenance_id, supply_id, quantity, expense_id FROM supply_usages WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(usage_from_row).transpose()?)
    }

    async fn usages_for(&self, maintenance_id: i64) -> Result<Vec<SupplyUsage>, AppError> {
        let rows = sqlx::query(
            r#"
            SELECT id, maintenance_id, supply_id, quantity, expense_id
            FROM supply_usages
            WHERE maintenance_id = $1
            ORDER BY id
            "#,
        )
        .bind(maintenance_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(usage_from_row)
            .collect::<Result<Vec<_>, _>>()?)
    }

    async fn list_expenses(&self, query: &ExpenseQuery) -> Result<Vec<Expense>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {} FROM expenses WHERE TRUE",
            EXPENSE_COLUMNS
        ));
        if let Some(from) = query.from {
            qb.push(" AND date >= ").push_bind(from);
        }
        if let Some(to) = query.to {
            qb.push(" AND date <= ").push_bind(to);
        }
        if let Some(maintenance_id) = query.maintenance_id {
            qb.push(" AND maintenance_id = ").push_bind(maintenance_id);
        }
        qb.push(" ORDER BY date, id");

        let rows = qb.build().fetch_all(&self.pool).await?;
        Ok(rows
            .iter()
            .map(expense_from_row)
            .collect::<Result<Vec<_>, _>>()?)
    }

    async fn get_expense(&self, id: i64) -> Result<Option<Expense>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM expenses WHERE id = $1",
            EXPENSE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(expense_from_row).transpose()?)
    }

    async fn delete_expense(&self, id: i64) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(&format!(
            "DELETE FROM expenses WHERE id = $1 RETURNING {}",
            EXPENSE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(row) = row else {
            return Ok(false);
        };
        let expense = expense_from_row(&row)?;

        // the linked usage goes with the expense through ON DELETE CASCADE
        sqlx::query("UPDATE supplies SET stock = stock + $2 WHERE id = $1")
            .bind(expense.supply_id)
            .bind(expense.quantity)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(true)
    }

    async fn expenses_total(&self, range: &DateRange) -> Result<Cents, AppError> {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(total_cents), 0)::BIGINT
            FROM expenses
            WHERE ($1::DATE IS NULL OR date >= $1) AND ($2::DATE IS NULL OR date <= $2)
            "#,
        )
        .bind(range.from)
        .bind(range.to)
        .fetch_one(&self.pool)
        .await?;

        Ok(total)
    }
}
