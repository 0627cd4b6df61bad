//! Idempotent schema evolution helpers.
//!
//! Each `ensure_*` function checks the live schema first and only issues DDL when
//! something is missing, so they can run on every startup.

use super::{Column, Table};
use anyhow::{Context, Result};
use rusqlite::{params, Connection};
use tracing::{debug, info};

pub fn table_exists(conn: &Connection, table_name: &str) -> Result<bool> {
    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            params![table_name],
            |row| row.get(0),
        )
        .with_context(|| format!("Failed to look up table {}", table_name))?;
    Ok(count > 0)
}

pub fn column_exists(conn: &Connection, table_name: &str, column_name: &str) -> Result<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table_name))?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(names.iter().any(|name| name.eq_ignore_ascii_case(column_name)))
}

/// Creates `table` when no table with its name exists. Returns whether it was created.
pub fn ensure_table(conn: &Connection, table: &Table) -> Result<bool> {
    if table_exists(conn, table.name)? {
        debug!("Table {} already present", table.name);
        return Ok(false);
    }
    table
        .create(conn)
        .with_context(|| format!("Failed to create table {}", table.name))?;
    info!("Created table {}", table.name);
    Ok(true)
}

/// Appends `column` to `table_name` when missing. Returns whether it was added.
///
/// The table itself must exist; SQLite cannot add PRIMARY KEY or UNIQUE columns this way.
pub fn ensure_column(conn: &Connection, table_name: &str, column: &Column) -> Result<bool> {
    if column_exists(conn, table_name, column.name)? {
        debug!("Column {}.{} already present", table_name, column.name);
        return Ok(false);
    }
    conn.execute(
        &format!(
            "ALTER TABLE {} ADD COLUMN {}",
            table_name,
            column.definition_sql()
        ),
        [],
    )
    .with_context(|| format!("Failed to add column {}.{}", table_name, column.name))?;
    info!("Added column {}.{}", table_name, column.name);
    Ok(true)
}
