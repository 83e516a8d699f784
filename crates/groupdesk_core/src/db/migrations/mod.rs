//! SQLite migration registry and executor.
//!
//! # Invariants
//! - `version` values must remain monotonic.
//! - Applied migration version is mirrored to `PRAGMA user_version`.
//! - All pending migrations are applied in one transaction.
//! - Data steps run right after the SQL of their own version.

use crate::db::{search_key, DbError, DbResult};
use log::info;
use rusqlite::{params, Connection, Transaction};

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    sql: &'static str,
    /// Row rewrite that SQL alone cannot express.
    data_step: Option<fn(&Transaction<'_>) -> DbResult<()>>,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        sql: include_str!("0001_init.sql"),
        data_step: None,
    },
    Migration {
        version: 2,
        sql: include_str!("0002_lookup_indexes.sql"),
        data_step: None,
    },
    Migration {
        version: 3,
        sql: include_str!("0003_name_search.sql"),
        data_step: Some(backfill_name_search),
    },
];

/// Returns the latest migration version known by this binary.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Applies all pending migrations on the provided connection.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let current_version = current_user_version(conn)?;
    let latest = latest_version();

    if current_version > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: current_version,
            latest_supported: latest,
        });
    }

    if current_version == latest {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for migration in MIGRATIONS
        .iter()
        .filter(|migration| migration.version > current_version)
    {
        tx.execute_batch(migration.sql)?;
        if let Some(data_step) = migration.data_step {
            data_step(&tx)?;
        }
        tx.execute_batch(&format!("PRAGMA user_version = {};", migration.version))?;
    }
    tx.commit()?;

    info!(
        "event=db_migrate module=db status=ok from_version={} to_version={}",
        current_version, latest
    );
    Ok(())
}

/// Reads the schema version recorded on the connection.
pub fn current_user_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}

/// Fills `music_groups.name_search` for rows written before the column existed.
fn backfill_name_search(tx: &Transaction<'_>) -> DbResult<()> {
    let names = {
        let mut stmt = tx.prepare("SELECT group_uuid, name FROM music_groups;")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        rows.collect::<Result<Vec<_>, _>>()?
    };
    for (group_uuid, name) in &names {
        tx.execute(
            "UPDATE music_groups SET name_search = ?2 WHERE group_uuid = ?1;",
            params![group_uuid.as_str(), search_key(name)],
        )?;
    }
    Ok(())
}
