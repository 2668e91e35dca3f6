//! Database initialization
//!
//! Opens (or creates) the SQLite database, applies connection settings and
//! creates the enrichment schema. Safe to run against an existing file.

use crate::config::MEMORY_DATABASE;
use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// Initialize database connection and create tables if needed
///
/// `location` is a file path or `:memory:`. An in-memory database lives in a
/// single pinned connection so every query sees the same data.
pub async fn init_database(location: &str) -> Result<SqlitePool> {
    let pool = if location == MEMORY_DATABASE {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

        // Never recycle the connection: dropping it would drop the database
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
            .connect_with(options)
            .await?
    } else {
        let db_path = Path::new(location);
        let newly_created = !db_path.exists();

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        // WAL allows concurrent readers with one writer
        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_millis(5000));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        if newly_created {
            info!("Initialized new database: {}", db_path.display());
        } else {
            info!("Opened existing database: {}", db_path.display());
        }

        pool
    };

    create_enrichments_table(&pool).await?;
    sync_enrichments_columns(&pool).await?;

    Ok(pool)
}

/// Create the enrichments table
///
/// Maps and sets are stored as JSON text: `result` and `job_providers` are
/// objects keyed by job type, `requested_jobs` and `completed_jobs` arrays.
pub async fn create_enrichments_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS enrichments (
            id TEXT PRIMARY KEY,
            subject_id TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'pending',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            result TEXT NOT NULL DEFAULT '{}',
            job_providers TEXT NOT NULL DEFAULT '{}',
            requested_jobs TEXT NOT NULL DEFAULT '["phone"]',
            completed_jobs TEXT NOT NULL DEFAULT '[]',
            contact_hint TEXT,
            is_static INTEGER NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_enrichments_status ON enrichments(status)")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_enrichments_created_at ON enrichments(created_at)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Columns added after the first release, with their definitions
const LATE_COLUMNS: &[(&str, &str)] = &[
    ("contact_hint", "TEXT"),
    ("is_static", "INTEGER NOT NULL DEFAULT 0"),
];

/// Add any missing late columns to an existing enrichments table
async fn sync_enrichments_columns(pool: &SqlitePool) -> Result<()> {
    for (name, definition) in LATE_COLUMNS {
        let has_column: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM pragma_table_info('enrichments') WHERE name = ?",
        )
        .bind(name)
        .fetch_one(pool)
        .await?;

        if has_column == 0 {
            sqlx::query(&format!(
                "ALTER TABLE enrichments ADD COLUMN {} {}",
                name, definition
            ))
            .execute(pool)
            .await?;
            info!("Added {} column to enrichments table", name);
        }
    }

    Ok(())
}
