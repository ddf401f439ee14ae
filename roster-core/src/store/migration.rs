// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Database Schema Migration Framework
//!
//! Provides versioned schema migrations with transactional safety.
//! The runner tracks applied versions in a `schema_version` table and runs
//! pending migrations in order within a single transaction.

use rusqlite::Connection;

use super::{now_secs, StoreError};

/// A single schema migration step.
pub struct Migration {
    /// Monotonically increasing version number (starting at 1).
    pub version: u32,
    /// Human-readable name for this migration.
    pub name: &'static str,
    /// SQL executed as one batch.
    pub sql: &'static str,
}

/// Runs schema migrations against a database connection.
pub struct MigrationRunner;

impl MigrationRunner {
    /// Runs all pending migrations in a transaction.
    ///
    /// Creates the `schema_version` table if it doesn't exist, then applies
    /// any migrations whose version is greater than the current schema version.
    /// If any migration fails, all pending changes are rolled back.
    pub fn run(conn: &Connection, migrations: &[Migration]) -> Result<(), StoreError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY,
                applied_at INTEGER NOT NULL
            );",
        )?;

        let current_version = Self::current_version(conn)?;

        let pending: Vec<&Migration> = migrations
            .iter()
            .filter(|m| m.version > current_version)
            .collect();

        if pending.is_empty() {
            return Ok(());
        }

        for window in pending.windows(2) {
            if window[0].version >= window[1].version {
                return Err(StoreError::Migration(format!(
                    "Migrations are not in order: v{} before v{}",
                    window[0].version, window[1].version
                )));
            }
        }

        conn.execute_batch("BEGIN EXCLUSIVE TRANSACTION;")?;

        for migration in &pending {
            if let Err(e) = conn.execute_batch(migration.sql) {
                conn.execute_batch("ROLLBACK;")?;
                return Err(StoreError::Migration(format!(
                    "Migration v{} '{}' failed: {}",
                    migration.version, migration.name, e
                )));
            }

            if let Err(e) = conn.execute(
                "INSERT INTO schema_version (version, applied_at) VALUES (?1, ?2)",
                rusqlite::params![migration.version, now_secs()],
            ) {
                conn.execute_batch("ROLLBACK;")?;
                return Err(StoreError::Migration(format!(
                    "Failed to record migration v{}: {}",
                    migration.version, e
                )));
            }
            tracing::debug!("applied migration v{} '{}'", migration.version, migration.name);
        }

        conn.execute_batch("COMMIT;")?;
        Ok(())
    }

    /// Returns the current schema version, or 0 if no migrations have been applied.
    pub fn current_version(conn: &Connection) -> Result<u32, StoreError> {
        let table_exists: bool = conn.query_row(
            "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name='schema_version'",
            [],
            |row| row.get(0),
        )?;

        if !table_exists {
            return Ok(0);
        }

        let version: Option<u32> =
            conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| {
                row.get(0)
            })?;

        Ok(version.unwrap_or(0))
    }
}

/// Returns all registered migrations in version order.
///
/// This is the single source of truth for the database schema.
/// New migrations are appended to the end of this list.
pub fn all_migrations() -> Vec<Migration> {
    vec![
        Migration {
            version: 1,
            name: "baseline_schema",
            sql: MIGRATION_V1_BASELINE,
        },
        Migration {
            version: 2,
            name: "registrations",
            sql: MIGRATION_V2_REGISTRATIONS,
        },
        Migration {
            version: 3,
            name: "registration_attendance",
            sql: MIGRATION_V3_ATTENDANCE,
        },
        Migration {
            version: 4,
            name: "activity_assignees",
            sql: MIGRATION_V4_ASSIGNEES,
        },
        Migration {
            version: 5,
            name: "participant_influx",
            sql: MIGRATION_V5_INFLUX,
        },
    ]
}

const MIGRATION_V1_BASELINE: &str = "
    CREATE TABLE activity_types (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        description TEXT,
        created_at INTEGER NOT NULL
    );

    CREATE TABLE activities (
        id TEXT PRIMARY KEY,
        activity_type_id TEXT NOT NULL REFERENCES activity_types(id),
        date TEXT NOT NULL,
        comment TEXT,
        created_at INTEGER NOT NULL
    );

    CREATE TABLE participants (
        id TEXT PRIMARY KEY,
        first_name TEXT NOT NULL,
        last_name TEXT NOT NULL,
        participant_role TEXT,
        created_at INTEGER NOT NULL
    );

    CREATE TABLE participant_activity_types (
        id TEXT PRIMARY KEY,
        participant_id TEXT NOT NULL REFERENCES participants(id),
        activity_type_id TEXT NOT NULL REFERENCES activity_types(id),
        created_at INTEGER NOT NULL,
        UNIQUE (participant_id, activity_type_id)
    );

    CREATE INDEX idx_participants_first_name ON participants(first_name);
";

const MIGRATION_V2_REGISTRATIONS: &str = "
    CREATE TABLE registrations (
        id TEXT PRIMARY KEY,
        participant_id TEXT NOT NULL REFERENCES participants(id),
        activity_id TEXT NOT NULL REFERENCES activities(id),
        created_at INTEGER NOT NULL,
        UNIQUE (participant_id, activity_id)
    );

    CREATE INDEX idx_registrations_activity ON registrations(activity_id);
";

const MIGRATION_V3_ATTENDANCE: &str = "
    ALTER TABLE registrations ADD COLUMN attended INTEGER;
";

const MIGRATION_V4_ASSIGNEES: &str = "
    CREATE TABLE activity_assignees (
        id TEXT PRIMARY KEY,
        activity_id TEXT NOT NULL REFERENCES activities(id),
        participant_id TEXT NOT NULL REFERENCES participants(id),
        created_at INTEGER NOT NULL,
        UNIQUE (activity_id, participant_id)
    );
";

const MIGRATION_V5_INFLUX: &str = "
    ALTER TABLE participants ADD COLUMN influx TEXT;
";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_database_reaches_latest_version() {
        let conn = Connection::open_in_memory().unwrap();
        MigrationRunner::run(&conn, &all_migrations()).unwrap();
        assert_eq!(MigrationRunner::current_version(&conn).unwrap(), 5);
    }

    #[test]
    fn test_rerun_is_noop() {
        let conn = Connection::open_in_memory().unwrap();
        MigrationRunner::run(&conn, &all_migrations()).unwrap();
        MigrationRunner::run(&conn, &all_migrations()).unwrap();
        assert_eq!(MigrationRunner::current_version(&conn).unwrap(), 5);
    }

    #[test]
    fn test_failed_migration_rolls_back() {
        let conn = Connection::open_in_memory().unwrap();
        let migrations = vec![
            Migration {
                version: 1,
                name: "ok",
                sql: "CREATE TABLE t (id INTEGER);",
            },
            Migration {
                version: 2,
                name: "broken",
                sql: "CREATE TABLE nope (",
            },
        ];

        let err = MigrationRunner::run(&conn, &migrations).unwrap_err();
        assert!(matches!(err, StoreError::Migration(_)));
        assert_eq!(MigrationRunner::current_version(&conn).unwrap(), 0);

        let exists: bool = conn
            .query_row(
                "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name='t'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert!(!exists);
    }

    #[test]
    fn test_out_of_order_migrations_rejected() {
        let conn = Connection::open_in_memory().unwrap();
        let migrations = vec![
            Migration {
                version: 2,
                name: "second",
                sql: "SELECT 1;",
            },
            Migration {
                version: 1,
                name: "first",
                sql: "SELECT 1;",
            },
        ];
        let err = MigrationRunner::run(&conn, &migrations).unwrap_err();
        assert!(matches!(err, StoreError::Migration(_)));
    }
}
