//! Schema migrations.
//!
//! Applied versions are recorded in `_migrations`. Each pending migration
//! runs in its own transaction together with its `_migrations` row, so a
//! failure leaves the schema at the previous version and the next open
//! retries it.

use rusqlite::{params, Connection};

use super::error::DatabaseError;

/// A single migration definition.
struct Migration {
    version: u32,
    description: &'static str,
    sql: &'static str,
}

/// All migrations in order. Each is applied at most once.
const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "create_content_records_table",
        sql: include_str!("sql/001_create_content_records.sql"),
    },
    Migration {
        version: 2,
        description: "create_record_dimensions_table",
        sql: include_str!("sql/002_create_record_dimensions.sql"),
    },
    Migration {
        version: 3,
        description: "create_run_leases_table",
        sql: include_str!("sql/003_create_run_leases.sql"),
    },
];

fn ensure_ledger(conn: &Connection) -> Result<(), DatabaseError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS _migrations (
            version INTEGER PRIMARY KEY,
            description TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )?;
    Ok(())
}

/// Highest applied migration version, 0 on a fresh database.
pub fn schema_version(conn: &Connection) -> Result<u32, DatabaseError> {
    ensure_ledger(conn)?;
    Ok(conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM _migrations",
        [],
        |r| r.get(0),
    )?)
}

/// Runs all pending migrations on the given connection.
pub fn run_all(conn: &Connection) -> Result<(), DatabaseError> {
    apply(conn, MIGRATIONS)
}

fn apply(conn: &Connection, migrations: &[Migration]) -> Result<(), DatabaseError> {
    let current = schema_version(conn)?;

    for migration in migrations.iter().filter(|m| m.version > current) {
        log::info!(
            "Running migration v{}: {}",
            migration.version,
            migration.description
        );

        let migration_error = |e: rusqlite::Error| DatabaseError::Migration {
            version: migration.version,
            reason: e.to_string(),
        };

        let tx = conn.unchecked_transaction()?;
        tx.execute_batch(migration.sql).map_err(migration_error)?;
        tx.execute(
            "INSERT INTO _migrations (version, description) VALUES (?1, ?2)",
            params![migration.version, migration.description],
        )
        .map_err(migration_error)?;
        tx.commit()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_exists(conn: &Connection, table: &str) -> bool {
        conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [table],
            |r| r.get::<_, i64>(0),
        )
        .unwrap()
            == 1
    }

    #[test]
    fn test_migrations_run_on_fresh_db() {
        let conn = Connection::open_in_memory().unwrap();
        run_all(&conn).unwrap();

        let count: u32 = conn
            .query_row("SELECT COUNT(*) FROM _migrations", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, MIGRATIONS.len() as u32);
        assert!(table_exists(&conn, "content_records"));
        assert!(table_exists(&conn, "record_dimensions"));
        assert!(table_exists(&conn, "run_leases"));
    }

    #[test]
    fn test_migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run_all(&conn).unwrap();
        run_all(&conn).unwrap();

        let count: u32 = conn
            .query_row("SELECT COUNT(*) FROM _migrations", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, MIGRATIONS.len() as u32);
    }

    #[test]
    fn test_failed_migration_rolls_back_with_its_ledger_row() {
        let conn = Connection::open_in_memory().unwrap();
        let steps = [
            Migration {
                version: 1,
                description: "create_a",
                sql: "CREATE TABLE a (id INTEGER PRIMARY KEY);",
            },
            Migration {
                version: 2,
                description: "create_b_then_fail",
                sql: "CREATE TABLE b (id INTEGER PRIMARY KEY); INSERT INTO missing VALUES (1);",
            },
        ];

        let err = apply(&conn, &steps).unwrap_err();
        assert!(matches!(err, DatabaseError::Migration { version: 2, .. }));
        assert_eq!(schema_version(&conn).unwrap(), 1);
        assert!(table_exists(&conn, "a"));
        assert!(!table_exists(&conn, "b"));

        // A fixed migration applies on the next attempt.
        let fixed = [
            Migration {
                version: 2,
                description: "create_b",
                sql: "CREATE TABLE b (id INTEGER PRIMARY KEY);",
            },
        ];
        apply(&conn, &fixed).unwrap();
        assert_eq!(schema_version(&conn).unwrap(), 2);
        assert!(table_exists(&conn, "b"));
    }

    #[test]
    fn test_schema_version_tracks_latest() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(schema_version(&conn).unwrap(), 0);
        run_all(&conn).unwrap();
        assert_eq!(
            schema_version(&conn).unwrap(),
            MIGRATIONS.last().map(|m| m.version).unwrap()
        );
    }

    #[test]
    fn test_versions_are_strictly_increasing() {
        for pair in MIGRATIONS.windows(2) {
            assert!(pair[0].version < pair[1].version);
        }
    }
}
