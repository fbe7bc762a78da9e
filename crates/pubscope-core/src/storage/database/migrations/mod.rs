mod v1_initial;
mod v2_lookup_indexes;

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};

use crate::error::Result;

/// One forward-only schema step. Versions are applied in ascending order and
/// recorded in `schema_migrations`.
pub trait Migration {
    fn version(&self) -> u32;
    fn description(&self) -> &'static str;
    fn up(&self, conn: &Connection) -> Result<()>;
}

fn all_migrations() -> Vec<Box<dyn Migration>> {
    vec![
        Box::new(v1_initial::V1Initial),
        Box::new(v2_lookup_indexes::V2LookupIndexes),
    ]
}

fn has_migrations_table(conn: &Connection) -> Result<bool> {
    let found = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'schema_migrations'",
            [],
            |_| Ok(()),
        )
        .optional()?;
    Ok(found.is_some())
}

/// Bring the schema up to date and return the versions applied by this call.
pub fn run_migrations(conn: &Connection) -> Result<Vec<u32>> {
    let applied = get_applied_versions(conn)?;
    let mut newly_applied = Vec::new();

    for migration in all_migrations() {
        let version = migration.version();
        if applied.contains(&version) {
            continue;
        }

        tracing::debug!(version, "applying migration: {}", migration.description());
        migration.up(conn)?;
        conn.execute(
            "INSERT OR IGNORE INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
            params![version, Utc::now().to_rfc3339()],
        )?;
        newly_applied.push(version);
    }

    Ok(newly_applied)
}

pub fn get_applied_versions(conn: &Connection) -> Result<Vec<u32>> {
    if !has_migrations_table(conn)? {
        return Ok(Vec::new());
    }

    let mut stmt = conn.prepare("SELECT version FROM schema_migrations ORDER BY version")?;
    let versions = stmt
        .query_map([], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<u32>>>()?;
    Ok(versions)
}
