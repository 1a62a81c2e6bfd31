// Credential store: SQLite behind the async Database trait.
//
// rusqlite is built with "bundled", so no system SQLite is needed. The file
// lives at TENOR_DB_PATH (default ./tenor.db).

pub mod models;
pub mod queries;
pub mod schema;
pub mod sqlite;
pub mod traits;

pub use sqlite::SqliteDatabase;
pub use traits::Database;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use rusqlite::Connection;

/// Create the database file (and its directory) if needed, then migrate.
///
/// Used by `tenor init` and `tenor serve`.
pub fn initialize_sqlite(db_path: &str) -> Result<Arc<dyn Database>> {
    let parent = Path::new(db_path).parent().filter(|p| !p.as_os_str().is_empty());
    if let Some(parent) = parent {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory for database: {db_path}"))?;
    }
    connect(db_path)
}

/// Open a database created earlier by `tenor init`.
pub fn open_sqlite(db_path: &str) -> Result<Arc<dyn Database>> {
    if !Path::new(db_path).exists() {
        anyhow::bail!("Database not found at {db_path}. Run `tenor init` first.");
    }
    connect(db_path)
}

/// Fresh in-memory database with the schema applied.
pub fn in_memory() -> Result<Arc<dyn Database>> {
    let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
    schema::create_tables(&conn)?;
    Ok(Arc::new(SqliteDatabase::new(conn)))
}

fn connect(db_path: &str) -> Result<Arc<dyn Database>> {
    let conn = Connection::open(db_path)
        .with_context(|| format!("Failed to open database at {db_path}"))?;
    conn.pragma_update(None, "journal_mode", "WAL")?;
    // Older files pick up migrations added since they were created
    schema::create_tables(&conn)?;
    Ok(Arc::new(SqliteDatabase::new(conn)))
}
