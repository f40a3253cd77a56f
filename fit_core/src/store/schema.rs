//! Schema migrations.
//!
//! Migrations are applied in order inside one transaction and the applied
//! version is mirrored to `PRAGMA user_version`.

use crate::{Error, Result};
use rusqlite::Connection;

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        sql: include_str!("migrations/0001_init.sql"),
    },
    Migration {
        version: 2,
        sql: include_str!("migrations/0002_workouts.sql"),
    },
    Migration {
        version: 3,
        sql: include_str!("migrations/0003_routines.sql"),
    },
];

/// Latest schema version known to this build
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

pub fn current_version(conn: &Connection) -> Result<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}

/// Apply all pending migrations
pub fn apply_migrations(conn: &mut Connection) -> Result<()> {
    let current = current_version(conn)?;
    let latest = latest_version();

    if current > latest {
        return Err(Error::Schema {
            found: current,
            supported: latest,
        });
    }

    if current == latest {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for migration in MIGRATIONS {
        if migration.version <= current {
            continue;
        }

        tx.execute_batch(migration.sql)?;
        tx.execute_batch(&format!("PRAGMA user_version = {};", migration.version))?;
        tracing::debug!("Applied schema migration {}", migration.version);
    }
    tx.commit()?;

    tracing::info!("Database migrated from version {} to {}", current, latest);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_reach_latest() {
        let mut conn = Connection::open_in_memory().unwrap();
        apply_migrations(&mut conn).unwrap();
        assert_eq!(current_version(&conn).unwrap(), latest_version());

        // Second run is a no-op
        apply_migrations(&mut conn).unwrap();
        assert_eq!(current_version(&conn).unwrap(), latest_version());
    }

    #[test]
    fn test_newer_database_rejected() {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version() + 1))
            .unwrap();

        let err = apply_migrations(&mut conn).unwrap_err();
        assert!(matches!(err, Error::Schema { .. }));
    }

    #[test]
    fn test_all_tables_created() {
        let mut conn = Connection::open_in_memory().unwrap();
        apply_migrations(&mut conn).unwrap();

        for table in [
            "users",
            "exercise_entries",
            "food_entries",
            "workout_entries",
            "goals",
            "custom_activities",
            "routines",
            "routine_items",
        ] {
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
                    [table],
                    |row| row.get(0),
                )
                .unwrap();
            assert_eq!(count, 1, "missing table {}", table);
        }
    }
}
