// SqliteDatabase — rusqlite backend implementing the Database trait.
//
// The Connection is wrapped in tokio::sync::Mutex because Connection is !Sync.
// Trait methods lock the mutex, do synchronous rusqlite work, and return.

use anyhow::Result;
use async_trait::async_trait;
use rusqlite::Connection;
use tokio::sync::Mutex;

use super::models::UserRecord;
use super::traits::Database;

pub struct SqliteDatabase {
    conn: Mutex<Connection>,
}

impl SqliteDatabase {
    /// Wrap an already-opened rusqlite Connection.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }
}

#[async_trait]
impl Database for SqliteDatabase {
    async fn table_count(&self) -> Result<i64> {
        let conn = self.conn.lock().await;
        super::schema::table_count(&conn)
    }

    async fn create_user(&self, username: &str, salt: &str, password_hash: &str) -> Result<bool> {
        let conn = self.conn.lock().await;
        super::queries::insert_user(&conn, username, salt, password_hash)
    }

    async fn get_user(&self, username: &str) -> Result<Option<UserRecord>> {
        let conn = self.conn.lock().await;
        super::queries::get_user(&conn, username)
    }

    async fn user_count(&self) -> Result<i64> {
        let conn = self.conn.lock().await;
        super::queries::user_count(&conn)
    }

    async fn record_login(&self, username: &str) -> Result<()> {
        let conn = self.conn.lock().await;
        super::queries::record_login(&conn, username)
    }

    async fn get_last_login(&self, username: &str) -> Result<Option<String>> {
        let conn = self.conn.lock().await;
        super::queries::get_last_login(&conn, username)
    }
}
