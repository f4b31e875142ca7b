use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::{
    errors::AppError,
    storage::{
        models::{Cents, DateRange, Income, IncomeInput, RecurringInput, RecurringMovement},
        traits::FinanceStore,
    },
};

const INCOME_COLUMNS: &str = "id, client_id, contract_id, concept, total_cents, date";
const RECURRING_COLUMNS: &str = "id, kind, concept, amount_cents, frequency, next_date, active";

pub struct PostgresFinanceStore {
    pool: PgPool,
}

impl PostgresFinanceStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn income_from_row(row: &PgRow) -> Result<Income, sqlx::Error> {
    Ok(Income {
        id: row.try_get("id")?,
        client_id: row.try_get("client_id")?,
        contract_id: row.try_get("contract_id")?,
        concept: row.try_get("concept")?,
        total_cents: row.try_get("total_cents")?,
        date: row.try_get("date")?,
    })
}

fn recurring_from_row(row: &PgRow) -> Result<RecurringMovement, AppError> {
    let kind: String = row.try_get("kind")?;
    let frequency: String = row.try_get("frequency")?;
    Ok(RecurringMovement {
        id: row.try_get("id")?,
        kind: kind.parse()?,
        concept: row.try_get("concept")?,
        amount_cents: row.try_get("amount_cents")?,
        frequency: frequency.parse()?,
        next_date: row.try_get("next_date")?,
        active: row.try_get("active")?,
    })
}

fn reference_error(err: sqlx::Error) -> AppError {
    match AppError::from_sqlx(err, "Referenced client or contract does not exist") {
        AppError::Conflict(msg) => AppError::BadRequest(msg),
        other => other,
    }
}

#[async_trait]
impl FinanceStore for PostgresFinanceStore {
    async fn list_incomes(&self, range: &DateRange) -> Result<Vec<Income>, AppError> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {}
            FROM incomes
            WHERE ($1::DATE IS NULL OR date >= $1) AND ($2::DATE IS NULL OR date <= $2)
            ORDER BY date, id
            "#,
            INCOME_COLUMNS
        ))
        .bind(range.from)
        .bind(range.to)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(income_from_row)
            .collect::<Result<Vec<_>, _>>()?)
    }

    async fn get_income(&self, id: i64) -> Result<Option<Income>, AppError> {
        let row = sqlx::query(&format!("SELECT {} FROM incomes WHERE id = $1", INCOME_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(income_from_row).transpose()?)
    }

    async fn create_income(&self, input: &IncomeInput) -> Result<Income, AppError> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO incomes (client_id, contract_id, concept, total_cents, date)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            INCOME_COLUMNS
        ))
        .bind(input.client_id)
        .bind(input.contract_id)
        .bind(&input.concept)
        .bind(input.total_cents)
        .bind(input.date)
        .fetch_one(&self.pool)
        .await
        .map_err(reference_error)?;

        Ok(income_from_row(&row)?)
    }

    async fn update_income(
        &self,
        id: i64,
        input: &IncomeInput,
    ) -> Result<Option<Income>, AppError> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE incomes
            SET client_id = $2, contract_id = $3, concept = $4, total_cents = $5, date = $6
            WHERE id = $1
            RETURNING {}
            "#,
            INCOME_COLUMNS
        ))
        .bind(id)
        .bind(input.client_id)
        .bind(input.contract_id)
        .bind(&input.concept)
        .bind(input.total_cents)
        .bind(input.date)
        .fetch_optional(&self.pool)
        .await
        .map_err(reference_error)?;

        Ok(row.as_ref().map(income_from_row).transpose()?)
    }

    async fn delete_income(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM incomes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn incomes_total(&self, range: &DateRange) -> Result<Cents, AppError> {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(total_cents), 0)::BIGINT
            FROM incomes
            WHERE ($1::DATE IS NULL OR date >= $1) AND ($2::DATE IS NULL OR date <= $2)
            "#,
        )
        .bind(range.from)
        .bind(range.to)
        .fetch_one(&self.pool)
        .await?;

        Ok(total)
    }

    async fn list_recurring(&self) -> Result<Vec<RecurringMovement>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM recurring_movements ORDER BY next_date, id",
            RECURRING_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(recurring_from_row).collect()
    }

    async fn get_recurring(&self, id: i64) -> Result<Option<RecurringMovement>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM recurring_movements WHERE id = $1",
            RECURRING_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(recurring_from_row).transpose()
    }

    async fn create_recurring(
        &self,
        input: &RecurringInput,
    ) -> Result<RecurringMovement, AppError> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO recurring_movements (kind, concept, amount_cents, frequency, next_date, active)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            RECURRING_COLUMNS
        ))
        .bind(input.kind.as_str())
        .bind(&input.concept)
        .bind(input.amount_cents)
        .bind(input.frequency.as_str())
        .bind(input.next_date)
        .bind(input.active)
        .fetch_one(&self.pool)
        .await?;

        recurring_from_row(&row)
    }

    async fn update_recurring(
        &self,
        id: i64,
        input: &RecurringInput,
    ) -> Result<Option<RecurringMovement>, AppError> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE recurring_movements
            SET kind = $2, concept = $3, amount_cents = $4, frequency = $5, next_date = $6, active = $7
            WHERE id = $1
            RETURNING {}
            "#,
            RECURRING_COLUMNS
        ))
        .bind(id)
        .bind(input.kind.as_str())
        .bind(&input.concept)
        .bind(input.amount_cents)
        .bind(input.frequency.as_str())
        .bind(input.next_date)
        .bind(input.active)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(recurring_from_row).transpose()
    }

    async fn delete_recurring(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM recurring_movements WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
