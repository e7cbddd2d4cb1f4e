//! SQLite store for user credentials and chat history.
//!
//! Queries use the runtime-checked `sqlx::query` form so no `DATABASE_URL`
//! is needed at compile time.

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;

use crate::models::{ChatRecord, User};

#[derive(Clone, Debug)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (or create) the database file at `path` and run migrations.
    pub async fn connect(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to open database at {}", path.display()))?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Private in-memory database. A single connection that is never recycled,
    /// since every new connection would see an empty database.
    pub async fn connect_in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT UNIQUE NOT NULL,
                password TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS chat_history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL,
                question TEXT NOT NULL,
                answer TEXT NOT NULL,
                timestamp DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_chat_history_username ON chat_history(username)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Insert a new user. Fails with a unique violation if the name is taken;
    /// check with [`is_unique_violation`].
    pub async fn create_user(&self, username: &str, password_hash: &str) -> sqlx::Result<i64> {
        let result = sqlx::query("INSERT INTO users (username, password) VALUES (?1, ?2)")
            .bind(username)
            .bind(password_hash)
            .execute(&self.pool)
            .await?;
        Ok(result.last_insert_rowid())
    }

    pub async fn find_user(&self, username: &str) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>("SELECT id, username, password FROM users WHERE username = ?1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
    }

    /// Returns false when no such user exists.
    pub async fn update_password(&self, username: &str, password_hash: &str) -> sqlx::Result<bool> {
        let result = sqlx::query("UPDATE users SET password = ?1 WHERE username = ?2")
            .bind(password_hash)
            .bind(username)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn record_exchange(
        &self,
        username: &str,
        question: &str,
        answer: &str,
    ) -> sqlx::Result<()> {
        sqlx::query("INSERT INTO chat_history (username, question, answer) VALUES (?1, ?2, ?3)")
            .bind(username)
            .bind(question)
            .bind(answer)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// All exchanges for `username`, newest first.
    pub async fn history_for(&self, username: &str) -> sqlx::Result<Vec<ChatRecord>> {
        sqlx::query_as::<_, ChatRecord>(
            "SELECT question, answer, CAST(timestamp AS TEXT) AS timestamp \
             FROM chat_history WHERE username = ?1 \
             ORDER BY timestamp DESC, id DESC",
        )
        .bind(username)
        .fetch_all(&self.pool)
        .await
    }
}

pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}
