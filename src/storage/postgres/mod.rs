pub mod clients;
pub mod connection;
pub mod contracts;
pub mod finance;
pub mod ledger;
pub mod maintenances;
pub mod notifications;
pub mod sessions;
pub mod supplies;
pub mod users;
pub mod workers;

pub use clients::PostgresClientStore;
pub use contracts::PostgresContractStore;
pub use finance::PostgresFinanceStore;
pub use ledger::PostgresLedgerStore;
pub use maintenances::PostgresMaintenanceStore;
pub use notifications::PostgresNotificationStore;
pub use sessions::PostgresSessionStore;
pub use supplies::PostgresSupplyStore;
pub use users::PostgresUserStore;
pub use workers::PostgresWorkerStore;

use sqlx::PgConnection;

/// Puts back the stock consumed by every usage on the visits selected by
/// `visits_sql` (a subquery taking `$1`).
pub(crate) async fn restore_stock(
    conn: &mut PgConnection,
    visits_sql: &str,
    id: i64,
) -> Result<(), sqlx::Error> {
    let sql = format!(
        r#"
        UPDATE supplies s
        SET stock = s.stock + u.quantity
        FROM (
            SELECT supply_id, SUM(quantity)::BIGINT AS quantity
            FROM supply_usages
            WHERE maintenance_id IN ({})
            GROUP BY supply_id
        ) u
        WHERE s.id = u.supply_id
        "#,
        visits_sql
    );
    sqlx::query(&sql).bind(id).execute(conn).await?;
    Ok(())
}
