//! Shared store schema migrations.
//!
//! Migrations are versioned and applied automatically when opening the store.
//! The `schema_version` table tracks the current migration version.

use rusqlite::{Connection, Result as SqliteResult};

/// Current schema version.
///
/// Increment this when adding new migrations.
pub const CURRENT_VERSION: i32 = 2;

/// Apply all pending migrations to bring the store to the current schema version.
///
/// Each step runs in its own `BEGIN IMMEDIATE` transaction and re-reads the
/// version under that lock, so two processes opening a fresh store at the
/// same time apply every step exactly once.
///
/// # Errors
/// Returns an error if migration fails.
pub fn migrate(conn: &Connection) -> SqliteResult<()> {
    create_schema_version_table(conn)?;
    apply_step(conn, 1, migrate_v1)?;
    apply_step(conn, 2, migrate_v2)?;
    Ok(())
}

fn apply_step(
    conn: &Connection,
    version: i32,
    step: fn(&Connection) -> SqliteResult<()>,
) -> SqliteResult<()> {
    conn.execute_batch("BEGIN IMMEDIATE")?;
    let result = if get_schema_version(conn) >= version {
        Ok(())
    } else {
        step(conn).and_then(|()| set_schema_version(conn, version))
    };
    match result {
        Ok(()) => conn.execute_batch("COMMIT"),
        Err(e) => {
            if let Err(rollback) = conn.execute_batch("ROLLBACK") {
                tracing::warn!(error = %rollback, version, "migration rollback failed");
            }
            Err(e)
        }
    }
}

fn create_schema_version_table(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        );",
    )
}

/// Returns 0 if no version is set (fresh store).
pub fn get_schema_version(conn: &Connection) -> i32 {
    conn.query_row("SELECT version FROM schema_version", [], |row| {
        row.get::<_, i32>(0)
    })
    .unwrap_or_else(|e| {
        if !matches!(e, rusqlite::Error::QueryReturnedNoRows) {
            tracing::warn!(error = %e, "failed to read schema_version");
        }
        0
    })
}

fn set_schema_version(conn: &Connection, version: i32) -> SqliteResult<()> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute(
        "INSERT INTO schema_version (version) VALUES (?1)",
        [version],
    )?;
    Ok(())
}

fn has_column(conn: &Connection, table: &str, column: &str) -> SqliteResult<bool> {
    conn.query_row(
        "SELECT COUNT(*) FROM pragma_table_info(?1) WHERE name = ?2",
        [table, column],
        |row| row.get::<_, i64>(0),
    )
    .map(|n| n > 0)
}

/// Migration v1: the key/value table.
fn migrate_v1(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS kv (
            key   TEXT PRIMARY KEY,
            value BLOB NOT NULL
        );",
    )
}

/// Migration v2: per-key write timestamps for diagnostics.
fn migrate_v2(conn: &Connection) -> SqliteResult<()> {
    if has_column(conn, "kv", "updated_at")? {
        return Ok(());
    }
    conn.execute_batch("ALTER TABLE kv ADD COLUMN updated_at TEXT NOT NULL DEFAULT '';")
}
