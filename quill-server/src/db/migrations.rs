//! Schema creation for the entry store
//!
//! Idempotent, run at startup. The FTS5 virtual table mirrors one row per
//! entry, keyed by rowid = entries.id; it is written only by
//! `EntryRepo::save`.

use sqlx::SqlitePool;

/// Create all tables and indexes.
pub async fn run(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    tracing::info!("Running migrations...");

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS entries (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            slug TEXT NOT NULL UNIQUE,
            content TEXT NOT NULL,
            published INTEGER NOT NULL DEFAULT 0,
            timestamp TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE VIRTUAL TABLE IF NOT EXISTS entries_fts USING fts5(content)")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_entries_published ON entries(published)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_entries_timestamp ON entries(timestamp DESC)")
        .execute(pool)
        .await?;

    tracing::info!("Migrations complete");
    Ok(())
}
