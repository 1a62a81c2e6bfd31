// Database schema: the users table plus numbered migrations.
//
// Version 1 is the base schema below. Later versions live in MIGRATIONS and
// are applied in order, each recorded in `schema_version` once it succeeds.

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};

/// Schema changes after the base schema, as (version, SQL).
const MIGRATIONS: &[(i64, &str)] = &[
    // Last successful login per user, for GET /api/me
    (2, "ALTER TABLE users ADD COLUMN last_login_at TEXT;"),
];

/// Create the base schema and bring it up to the latest version.
/// Safe to call on every startup.
pub fn create_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS users (
            username TEXT PRIMARY KEY,
            salt TEXT NOT NULL,                 -- hex
            password_hash TEXT NOT NULL,        -- pbkdf2-sha256$iterations$digest
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        INSERT OR IGNORE INTO schema_version (version) VALUES (1);
        ",
    )
    .context("Failed to create database tables")?;

    let current = current_version(conn)?;
    for &(version, sql) in MIGRATIONS.iter().filter(|(v, _)| *v > current) {
        let tx = conn.unchecked_transaction()?;
        tx.execute_batch(sql)
            .with_context(|| format!("Migration v{version} failed"))?;
        tx.execute(
            "INSERT INTO schema_version (version) VALUES (?1)",
            params![version],
        )?;
        tx.commit()?;
    }

    Ok(())
}

/// Highest applied schema version (0 for an empty database).
pub fn current_version(conn: &Connection) -> Result<i64> {
    let version: Option<i64> = conn
        .query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))
        .optional()?
        .flatten();
    Ok(version.unwrap_or(0))
}

/// Number of user-created tables, reported by `tenor init`.
pub fn table_count(conn: &Connection) -> Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
        [],
        |row| row.get(0),
    )
    .context("Failed to count tables")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn versions(conn: &Connection) -> Vec<i64> {
        conn.prepare("SELECT version FROM schema_version ORDER BY version")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .map(|r| r.unwrap())
            .collect()
    }

    #[test]
    fn test_repeated_startup_applies_each_version_once() {
        let conn = Connection::open_in_memory().unwrap();
        for _ in 0..3 {
            create_tables(&conn).unwrap();
        }
        assert_eq!(versions(&conn), vec![1, 2]);
        assert_eq!(current_version(&conn).unwrap(), 2);
    }

    #[test]
    fn test_schema_has_two_tables() {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        // schema_version, users
        assert_eq!(table_count(&conn).unwrap(), 2);
    }

    #[test]
    fn test_last_login_column_exists() {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        conn.execute(
            "INSERT INTO users (username, salt, password_hash, last_login_at)
             VALUES ('ann', '00', 'x', '2026-01-01 00:00:00')",
            [],
        )
        .unwrap();
        let last: String = conn
            .query_row(
                "SELECT last_login_at FROM users WHERE username = 'ann'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(last, "2026-01-01 00:00:00");
    }
}
