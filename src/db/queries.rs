// Database queries — all SQL lives here.

use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension};

use super::models::UserRecord;

/// Insert a user unless the username is taken. Returns true when a row was added.
pub fn insert_user(
    conn: &Connection,
    username: &str,
    salt: &str,
    password_hash: &str,
) -> Result<bool> {
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO users (username, salt, password_hash, created_at)
         VALUES (?1, ?2, ?3, datetime('now'))",
        params![username, salt, password_hash],
    )?;
    Ok(inserted == 1)
}

pub fn get_user(conn: &Connection, username: &str) -> Result<Option<UserRecord>> {
    let mut stmt = conn.prepare(
        "SELECT username, salt, password_hash, created_at FROM users WHERE username = ?1",
    )?;
    let user = stmt
        .query_row(params![username], |row| {
            Ok(UserRecord {
                username: row.get(0)?,
                salt: row.get(1)?,
                password_hash: row.get(2)?,
                created_at: row.get(3)?,
            })
        })
        .optional()?;
    Ok(user)
}

pub fn user_count(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
    Ok(count)
}

pub fn record_login(conn: &Connection, username: &str) -> Result<()> {
    conn.execute(
        "UPDATE users SET last_login_at = datetime('now') WHERE username = ?1",
        params![username],
    )?;
    Ok(())
}

pub fn get_last_login(conn: &Connection, username: &str) -> Result<Option<String>> {
    let last: Option<Option<String>> = conn
        .query_row(
            "SELECT last_login_at FROM users WHERE username = ?1",
            params![username],
            |row| row.get(0),
        )
        .optional()?;
    Ok(last.flatten())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema::create_tables;

    fn test_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        conn
    }

    #[test]
    fn test_user_roundtrip() {
        let conn = test_db();
        assert!(get_user(&conn, "ann").unwrap().is_none());

        assert!(insert_user(&conn, "ann", "abcd", "pbkdf2-sha256$1$ff").unwrap());
        let user = get_user(&conn, "ann").unwrap().unwrap();
        assert_eq!(user.username, "ann");
        assert_eq!(user.salt, "abcd");
        assert_eq!(user.password_hash, "pbkdf2-sha256$1$ff");
        assert!(!user.created_at.is_empty());
    }

    #[test]
    fn test_duplicate_username_is_ignored() {
        let conn = test_db();
        assert!(insert_user(&conn, "ann", "s1", "h1").unwrap());
        assert!(!insert_user(&conn, "ann", "s2", "h2").unwrap());

        // The original row is untouched
        let user = get_user(&conn, "ann").unwrap().unwrap();
        assert_eq!(user.salt, "s1");
        assert_eq!(user_count(&conn).unwrap(), 1);
    }

    #[test]
    fn test_record_login() {
        let conn = test_db();
        insert_user(&conn, "ann", "s", "h").unwrap();
        assert_eq!(get_last_login(&conn, "ann").unwrap(), None);

        record_login(&conn, "ann").unwrap();
        assert!(get_last_login(&conn, "ann").unwrap().is_some());
        assert_eq!(get_last_login(&conn, "nobody").unwrap(), None);
    }
}
