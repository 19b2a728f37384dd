use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;

use crate::errors::{DbError, DbResult};

/// Open the shared connection pool. The pool is shared across all concurrent
/// previews and exports, so it is sized to tolerate several long-running
/// windowed queries at once.
pub async fn init_pool(db_path: &str) -> DbResult<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&format!("sqlite://{}", db_path))
        .map_err(DbError::Sqlx)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(30));

    SqlitePoolOptions::new()
        .max_connections(20)
        .acquire_timeout(Duration::from_secs(30))
        .connect_with(options)
        .await
        .map_err(|e| DbError::ConnectionPool(e.to_string()))
}

/// Create the report schema if it does not exist yet. Idempotent.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS cell_report (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            date_time TEXT NOT NULL,
            shift TEXT NOT NULL,
            operator TEXT NOT NULL,
            cell_position INTEGER,
            cell_barcode TEXT NOT NULL,
            barley_paper_positive REAL,
            barley_paper_negative REAL,
            barley_paper_status INTEGER NOT NULL DEFAULT 0,
            capacity_min_set REAL,
            capacity_max_set REAL,
            capacity_actual REAL,
            capacity_status INTEGER NOT NULL DEFAULT 0,
            voltage_min_set REAL,
            voltage_max_set REAL,
            voltage_actual REAL,
            resistance_min_set REAL,
            resistance_max_set REAL,
            resistance_actual REAL,
            measurement_status INTEGER NOT NULL DEFAULT 0,
            final_status INTEGER NOT NULL DEFAULT 0,
            grade INTEGER NOT NULL DEFAULT 0,
            fail_reason TEXT
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(|e| DbError::Migration(e.to_string()))?;

    // Windowed reads order by (date_time, id); the index keeps offset scans sane.
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_cell_report_date_time ON cell_report (date_time, id)",
    )
    .execute(pool)
    .await
    .map_err(|e| DbError::Migration(e.to_string()))?;

    Ok(())
}
