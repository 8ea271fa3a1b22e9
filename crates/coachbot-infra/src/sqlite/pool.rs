//! Database pool with split reader/writer connections in WAL mode.
//!
//! SQLite allows only one writer at a time. `DatabasePool` pairs a small
//! read-only pool with a single-connection writer. Opening the pool runs the
//! embedded migrations and then adds the recency column if the table lacks it.
//! Both steps are safe on a store that predates the migration ledger.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;

/// Split read/write pool for SQLite with WAL mode.
///
/// - `reader`: Multi-connection pool (up to 4) for SELECT queries.
/// - `writer`: Single-connection pool for INSERT/UPDATE.
#[derive(Clone)]
pub struct DatabasePool {
    pub reader: SqlitePool,
    pub writer: SqlitePool,
}

impl DatabasePool {
    /// Open (creating if missing) and migrate the session database.
    pub async fn new(database_url: &str) -> Result<Self, sqlx::Error> {
        let base_opts = SqliteConnectOptions::from_str(database_url)?
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(std::time::Duration::from_secs(5))
            .create_if_missing(true);

        let read_opts = base_opts.clone().read_only(true);
        let write_opts = base_opts;

        let writer = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(write_opts)
            .await?;

        // Migrate before any reader connection sees the schema.
        sqlx::migrate!("../../migrations").run(&writer).await?;
        ensure_recency_column(&writer).await?;

        let reader = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(read_opts)
            .await?;

        Ok(Self { reader, writer })
    }
}

/// Add `last_interaction_at` when absent, backfilled from `created_at`.
///
/// Checked against the live schema rather than the migration ledger, so a
/// store that already has the column is left untouched.
async fn ensure_recency_column(writer: &SqlitePool) -> Result<(), sqlx::Error> {
    let present: (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM pragma_table_info('sessions') WHERE name = 'last_interaction_at'",
    )
    .fetch_one(writer)
    .await?;
    if present.0 > 0 {
        return Ok(());
    }

    tracing::info!("Adding last_interaction_at column to sessions");
    let mut tx = writer.begin().await?;
    sqlx::query("ALTER TABLE sessions ADD COLUMN last_interaction_at TEXT")
        .execute(&mut *tx)
        .await?;
    sqlx::query(
        "UPDATE sessions SET last_interaction_at = created_at WHERE last_interaction_at IS NULL",
    )
    .execute(&mut *tx)
    .await?;
    tx.commit().await
}
