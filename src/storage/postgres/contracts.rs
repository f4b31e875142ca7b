use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder, Row, postgres::PgRow};

use crate::{
    errors::AppError,
    storage::{
        models::{Cents, ChecklistTemplate, Contract, ContractInput, ContractQuery},
        postgres::restore_stock,
        traits::ContractStore,
    },
};

const CONTRACT_COLUMNS: &str = "c.id, c.client_id, c.kind, c.monthly_price_cents, c.start_date, c.active";

pub struct PostgresContractStore {
    pool: PgPool,
}

impl PostgresContractStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn contract_from_row(row: &PgRow) -> Result<Contract, AppError> {
    let kind: String = row.try_get("kind")?;
    Ok(Contract {
        id: row.try_get("id")?,
        client_id: row.try_get("client_id")?,
        kind: kind.parse()?,
        monthly_price_cents: row.try_get("monthly_price_cents")?,
        start_date: row.try_get("start_date")?,
        active: row.try_get("active")?,
    })
}

fn template_from_row(row: &PgRow) -> Result<ChecklistTemplate, sqlx::Error> {
    Ok(ChecklistTemplate {
        id: row.try_get("id")?,
        contract_id: row.try_get("contract_id")?,
        description: row.try_get("description")?,
    })
}

#[async_trait]
impl ContractStore for PostgresContractStore {
    async fn list_contracts(&self, query: &ContractQuery) -> Result<Vec<Contract>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {} FROM contracts c JOIN clients cl ON cl.id = c.client_id WHERE TRUE",
            CONTRACT_COLUMNS
        ));
        if let Some(kind) = query.kind {
            qb.push(" AND c.kind = ").push_bind(kind.as_str());
        }
        if let Some(active) = query.active {
            qb.push(" AND c.active = ").push_bind(active);
        }
        if let Some(client_id) = query.client_id {
            qb.push(" AND c.client_id = ").push_bind(client_id);
        }
        if let Some(search) = &query.search {
            qb.push(" AND strpos(lower(cl.name), ")
                .push_bind(search.to_lowercase())
                .push(") > 0");
        }
        qb.push(" ORDER BY c.id");

        let rows = qb.build().fetch_all(&self.pool).await?;
        rows.iter().map(contract_from_row).collect()
    }

    async fn get_contract(&self, id: i64) -> Result<Option<Contract>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM contracts c WHERE c.id = $1",
            CONTRACT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(contract_from_row).transpose()
    }

    async fn create_contract(&self, input: &ContractInput) -> Result<Contract, AppError> {
        let row = sqlx::query(
            r#"
            INSERT INTO contracts AS c (client_id, kind, monthly_price_cents, start_date, active)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING c.id, c.client_id, c.kind, c.monthly_price_cents, c.start_date, c.active
            "#,
        )
        .bind(input.client_id)
        .bind(input.kind.as_str())
        .bind(input.monthly_price_cents)
        .bind(input.start_date)
        .bind(input.active)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match AppError::from_sqlx(e, "Client does not exist") {
            AppError::Conflict(msg) => AppError::BadRequest(msg),
            other => other,
        })?;

        contract_from_row(&row)
    }

    async fn update_contract(
        &self,
        id: i64,
        input: &ContractInput,
    ) -> Result<Option<Contract>, AppError> {
        let row = sqlx::query(
            r#"
            UPDATE contracts AS c
            SET client_id = $2, kind = $3, monthly_price_cents = $4, start_date = $5, active = $6
            WHERE c.id = $1
            RETURNING c.id, c.client_id, c.kind, c.monthly_price_cents, c.start_date, c.active
            "#,
        )
        .bind(id)
        .bind(input.client_id)
        .bind(input.kind.as_str())
        .bind(input.monthly_price_cents)
        .bind(input.start_date)
        .bind(input.active)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| match AppError::from_sqlx(e, "Client does not exist") {
            AppError::Conflict(msg) => AppError::BadRequest(msg),
            other => other,
        })?;

        row.as_ref().map(contract_from_row).transpose()
    }

    async fn delete_contract(&self, id: i64) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;

        restore_stock(
            &mut tx,
            "SELECT id FROM maintenances WHERE contract_id = $1",
            id,
        )
        .await?;

        let result = sqlx::query("DELETE FROM contracts WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::from_sqlx(e, "Contract is referenced by incomes"))?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    async fn active_monthly_total(&self) -> Result<Cents, AppError> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(monthly_price_cents), 0)::BIGINT FROM contracts WHERE active",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(total)
    }

    async fn list_templates(&self, contract_id: i64) -> Result<Vec<ChecklistTemplate>, AppError> {
        let rows = sqlx::query(
            r#"
            SELECT id, contract_id, description
            FROM checklist_templates
            WHERE contract_id = $1
            ORDER BY id
            "#,
        )
        .bind(contract_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(template_from_row)
            .collect::<Result<Vec<_>, _>>()?)
    }

    async fn add_template(
        &self,
        contract_id: i64,
        description: &str,
    ) -> Result<ChecklistTemplate, AppError> {
        let row = sqlx::query(
            r#"
            INSERT INTO checklist_templates (contract_id, description)
            VALUES ($1, $2)
            RETURNING id, contract_id, description
            "#,
        )
        .bind(contract_id)
        .bind(description)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match AppError::from_sqlx(e, "Contract not found") {
            AppError::Conflict(msg) => AppError::NotFound(msg),
            other => other,
        })?;

        Ok(template_from_row(&row)?)
    }

    async fn delete_template(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM checklist_templates WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
