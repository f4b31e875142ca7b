use async_trait::async_trait;
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder, Row, postgres::PgRow};

use crate::{
    errors::AppError,
    storage::{
        models::{
            ChecklistItem, Maintenance, MaintenanceQuery, MaintenanceUpdate, NewMaintenance,
        },
        postgres::restore_stock,
        traits::MaintenanceStore,
    },
};

const SELECT_MAINTENANCE: &str = r#"
    SELECT m.id, m.client_id, m.contract_id, m.date, m.status, m.notes,
           ARRAY(
               SELECT mw.worker_id FROM maintenance_workers mw
               WHERE mw.maintenance_id = m.id ORDER BY mw.worker_id
           ) AS worker_ids
    FROM maintenances m
"#;

pub struct PostgresMaintenanceStore {
    pool: PgPool,
}

impl PostgresMaintenanceStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn maintenance_from_row(row: &PgRow) -> Result<Maintenance, AppError> {
    let status: String = row.try_get("status")?;
    Ok(Maintenance {
        id: row.try_get("id")?,
        client_id: row.try_get("client_id")?,
        contract_id: row.try_get("contract_id")?,
        date: row.try_get("date")?,
        worker_ids: row.try_get("worker_ids")?,
        status: status.parse()?,
        notes: row.try_get("notes")?,
    })
}

fn item_from_row(row: &PgRow) -> Result<ChecklistItem, sqlx::Error> {
    Ok(ChecklistItem {
        id: row.try_get("id")?,
        maintenance_id: row.try_get("maintenance_id")?,
        description: row.try_get("description")?,
        done: row.try_get("done")?,
        notes: row.try_get("notes")?,
    })
}

async fn fetch_maintenance(
    conn: &mut PgConnection,
    id: i64,
) -> Result<Option<Maintenance>, AppError> {
    let row = sqlx::query(&format!("{} WHERE m.id = $1", SELECT_MAINTENANCE))
        .bind(id)
        .fetch_optional(conn)
        .await?;

    row.as_ref().map(maintenance_from_row).transpose()
}

async fn assign_workers(
    conn: &mut PgConnection,
    maintenance_id: i64,
    worker_ids: &[i64],
) -> Result<(), AppError> {
    sqlx::query(
        r#"
        INSERT INTO maintenance_workers (maintenance_id, worker_id)
        SELECT $1, UNNEST($2::BIGINT[])
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(maintenance_id)
    .bind(worker_ids)
    .execute(conn)
    .await
    .map_err(|e| match AppError::from_sqlx(e, "Worker does not exist") {
        AppError::Conflict(msg) => AppError::BadRequest(msg),
        other => other,
    })?;

    Ok(())
}

#[async_trait]
impl MaintenanceStore for PostgresMaintenanceStore {
    async fn create_maintenance(&self, new: &NewMaintenance) -> Result<Maintenance, AppError> {
        let mut tx = self.pool.begin().await?;

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO maintenances (client_id, contract_id, date, notes)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(new.client_id)
        .bind(new.contract_id)
        .bind(new.date)
        .bind(&new.notes)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match AppError::from_sqlx(e, "Contract does not exist") {
            AppError::Conflict(msg) => AppError::BadRequest(msg),
            other => other,
        })?;

        assign_workers(&mut tx, id, &new.worker_ids).await?;

        sqlx::query(
            r#"
            INSERT INTO checklist_items (maintenance_id, description)
            SELECT $1, description FROM checklist_templates
            WHERE contract_id = $2
            ORDER BY id
            "#,
        )
        .bind(id)
        .bind(new.contract_id)
        .execute(&mut *tx)
        .await?;

        let maintenance = fetch_maintenance(&mut tx, id)
            .await?
            .ok_or_else(|| AppError::InternalError(anyhow::anyhow!("maintenance {} vanished", id)))?;

        tx.commit().await?;
        Ok(maintenance)
    }

    async fn get_maintenance(&self, id: i64) -> Result<Option<Maintenance>, AppError> {
        let mut conn = self.pool.acquire().await?;
        fetch_maintenance(&mut conn, id).await
    }

    async fn list_maintenances(
        &self,
        query: &MaintenanceQuery,
    ) -> Result<Vec<Maintenance>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new(SELECT_MAINTENANCE);
        qb.push(" WHERE TRUE");
        if let Some(on) = query.on {
            qb.push(" AND m.date = ").push_bind(on);
        }
        if let Some(from) = query.from {
            qb.push(" AND m.date >= ").push_bind(from);
        }
        if let Some(to) = query.to {
            qb.push(" AND m.date <= ").push_bind(to);
        }
        if let Some(before) = query.before {
            qb.push(" AND m.date < ").push_bind(before);
        }
        if let Some(after) = query.after {
            qb.push(" AND m.date > ").push_bind(after);
        }
        if let Some(status) = query.status {
            qb.push(" AND m.status = ").push_bind(status.as_str());
        }
        if let Some(worker_id) = query.worker_id {
            qb.push(
                " AND EXISTS (SELECT 1 FROM maintenance_workers mw \
                 WHERE mw.maintenance_id = m.id AND mw.worker_id = ",
            )
            .push_bind(worker_id)
            .push(")");
        }
        qb.push(" ORDER BY m.date, m.id");
        if let Some(limit) = query.limit {
            qb.push(" LIMIT ").push_bind(limit as i64);
        }

        let rows = qb.build().fetch_all(&self.pool).await?;
        rows.iter().map(maintenance_from_row).collect()
    }

    async fn update_maintenance(
        &self,
        id: i64,
        update: &MaintenanceUpdate,
    ) -> Result<Option<Maintenance>, AppError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE maintenances
            SET date = $2, status = $3, notes = $4
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(update.date)
        .bind(update.status.as_str())
        .bind(&update.notes)
        .execute(&mut *tx)
        .await?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }

        sqlx::query("DELETE FROM maintenance_workers WHERE maintenance_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        assign_workers(&mut tx, id, &update.worker_ids).await?;

        let maintenance = fetch_maintenance(&mut tx, id).await?;
        tx.commit().await?;
        Ok(maintenance)
    }

    async fn assigned_worker_ids(&self) -> Result<Vec<i64>, AppError> {
        let ids = sqlx::query_scalar::<_, i64>(
            "SELECT DISTINCT worker_id FROM maintenance_workers ORDER BY worker_id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    async fn delete_maintenance(&self, id: i64) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;

        restore_stock(&mut tx, "SELECT $1::BIGINT", id).await?;

        let result = sqlx::query("DELETE FROM maintenances WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    async fn checklist(&self, maintenance_id: i64) -> Result<Vec<ChecklistItem>, AppError> {
        let rows = sqlx::query(
            r#"
            SELECT id, maintenance_id, description, done, notes
            FROM checklist_items
            WHERE maintenance_id = $1
            ORDER BY id
            "#,
        )
        .bind(maintenance_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(item_from_row)
            .collect::<Result<Vec<_>, _>>()?)
    }

    async fn add_checklist_item(
        &self,
        maintenance_id: i64,
        description: &str,
    ) -> Result<ChecklistItem, AppError> {
        let row = sqlx::query(
            r#"
            INSERT INTO checklist_items (maintenance_id, description)
            VALUES ($1, $2)
            RETURNING id, maintenance_id, description, done, notes
            "#,
        )
        .bind(maintenance_id)
        .bind(description)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match AppError::from_sqlx(e, "Maintenance not found") {
            AppError::Conflict(msg) => AppError::NotFound(msg),
            other => other,
        })?;

        Ok(item_from_row(&row)?)
    }

    async fn get_checklist_item(&self, id: i64) -> Result<Option<ChecklistItem>, AppError> {
        let row = sqlx::query(
            "SELECT id, maintenance_id, description, done, notes FROM checklist_items WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(item_from_row).transpose()?)
    }

    async fn update_checklist_item(
        &self,
        id: i64,
        done: Option<bool>,
        notes: Option<&str>,
    ) -> Result<Option<ChecklistItem>, AppError> {
        let row = sqlx::query(
            r#"
            UPDATE checklist_items
            SET done = COALESCE($2, done), notes = COALESCE($3, notes)
            WHERE id = $1
            RETURNING id, maintenance_id, description, done, notes
            "#,
        )
        .bind(id)
        .bind(done)
        .bind(notes)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(item_from_row).transpose()?)
    }
}
