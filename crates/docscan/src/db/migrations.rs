//! Schema migrations.
//!
//! The schema version lives in SQLite's `user_version` pragma. Each pending
//! step runs in its own transaction together with the version bump, so a
//! failed step leaves the database at the previous version.

use rusqlite::Connection;

use super::error::DatabaseError;

enum Step {
    Sql(&'static str),
    /// Adds a column unless a database written by an older build already has it.
    AddColumn {
        table: &'static str,
        column: &'static str,
        definition: &'static str,
    },
}

struct Migration {
    name: &'static str,
    step: Step,
}

/// Applied in order; migration `i` brings the schema to version `i + 1`.
const MIGRATIONS: &[Migration] = &[
    Migration {
        name: "create_documents",
        step: Step::Sql(include_str!("sql/001_create_documents.sql")),
    },
    Migration {
        name: "add_documents_error",
        step: Step::AddColumn {
            table: "documents",
            column: "error",
            definition: "TEXT",
        },
    },
];

pub fn schema_version(conn: &Connection) -> Result<u32, DatabaseError> {
    Ok(conn.pragma_query_value(None, "user_version", |row| row.get(0))?)
}

/// Brings the schema up to the latest version.
pub fn run_all(conn: &Connection) -> Result<(), DatabaseError> {
    let current = schema_version(conn)? as usize;

    for (index, migration) in MIGRATIONS.iter().enumerate().skip(current) {
        let version = (index + 1) as u32;
        let failed = |e: rusqlite::Error| DatabaseError::Migration {
            version,
            reason: format!("{}: {}", migration.name, e),
        };

        let tx = conn.unchecked_transaction().map_err(failed)?;
        match &migration.step {
            Step::Sql(sql) => tx.execute_batch(sql).map_err(failed)?,
            Step::AddColumn {
                table,
                column,
                definition,
            } => {
                if has_column(&tx, table, column)? {
                    log::debug!("Column {}.{} already present", table, column);
                } else {
                    tx.execute_batch(&format!(
                        "ALTER TABLE {} ADD COLUMN {} {}",
                        table, column, definition
                    ))
                    .map_err(failed)?;
                }
            }
        }
        tx.pragma_update(None, "user_version", version)
            .map_err(failed)?;
        tx.commit().map_err(failed)?;

        log::info!("Applied migration {} ({})", version, migration.name);
    }

    Ok(())
}

fn has_column(conn: &Connection, table: &str, column: &str) -> Result<bool, DatabaseError> {
    let mut stmt = conn.prepare("SELECT 1 FROM pragma_table_info(?1) WHERE name = ?2")?;
    Ok(stmt.exists(rusqlite::params![table, column])?)
}
