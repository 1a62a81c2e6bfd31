// Database trait — async interface over the storage backend.
//
// Methods are async so the synchronous rusqlite connection (behind a tokio
// Mutex) can be shared with the web handlers as `Arc<dyn Database>`.

use anyhow::Result;
use async_trait::async_trait;

use super::models::UserRecord;

#[async_trait]
pub trait Database: Send + Sync {
    /// Count the number of user-created tables in the database.
    async fn table_count(&self) -> Result<i64>;

    /// Store a new user. Returns false if the username already exists.
    async fn create_user(&self, username: &str, salt: &str, password_hash: &str) -> Result<bool>;

    async fn get_user(&self, username: &str) -> Result<Option<UserRecord>>;

    async fn user_count(&self) -> Result<i64>;

    /// Stamp the user's last successful login with the current time.
    async fn record_login(&self, username: &str) -> Result<()>;

    async fn get_last_login(&self, username: &str) -> Result<Option<String>>;
}
