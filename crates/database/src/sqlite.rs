//! Embedded SQLite backend.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::{Feedback, Message, Sender, SessionLog, UnknownQuestion};
use crate::store::{new_id, BackendKind, ChatStore, ALL_MESSAGES_LIMIT};

/// File name of the database inside the data directory.
pub const DATABASE_FILE: &str = "chatbot.db";

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS sessions (
        id TEXT PRIMARY KEY,
        user_email TEXT,
        start_time DATETIME NOT NULL,
        end_time DATETIME,
        feedback_rating INTEGER,
        feedback_comments TEXT,
        feedback_helpful BOOLEAN
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS messages (
        id TEXT PRIMARY KEY,
        session_id TEXT NOT NULL,
        content TEXT NOT NULL,
        sender TEXT NOT NULL,
        category TEXT,
        timestamp DATETIME NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS unknown_questions (
        id TEXT PRIMARY KEY,
        session_id TEXT NOT NULL,
        question TEXT NOT NULL,
        timestamp DATETIME NOT NULL,
        reviewed BOOLEAN NOT NULL DEFAULT 0
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS inappropriate_logs (
        id TEXT PRIMARY KEY,
        session_id TEXT NOT NULL,
        content TEXT NOT NULL,
        user_ip TEXT,
        timestamp DATETIME NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_messages_session ON messages (session_id, timestamp)",
];

/// SQLite-backed store.
///
/// The pool holds a single connection, so writes are serialized through one
/// file handle.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if needed) `chatbot.db` inside `data_dir`.
    pub async fn open(data_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir)
            .map_err(|e| DatabaseError::unavailable(BackendKind::Sqlite)(sqlx::Error::Io(e)))?;

        let path = data_dir.join(DATABASE_FILE);
        let options = SqliteConnectOptions::new()
            .filename(&path)
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(DatabaseError::unavailable(BackendKind::Sqlite))?;

        tracing::info!(path = %path.display(), "Opened SQLite database");

        Ok(Self { pool })
    }

    /// Private in-memory database, mainly for tests.
    ///
    /// The single connection is never recycled, since closing it would drop
    /// the data.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(DatabaseError::unavailable(BackendKind::Sqlite))?;

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(DatabaseError::unavailable(BackendKind::Sqlite))?;

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl ChatStore for SqliteStore {
    fn kind(&self) -> BackendKind {
        BackendKind::Sqlite
    }

    async fn initialize(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(DatabaseError::unavailable(BackendKind::Sqlite))?;
        }

        tracing::debug!("SQLite tables initialized");
        Ok(())
    }

    async fn create_session(
        &self,
        user_email: Option<&str>,
        session_id: Option<&str>,
    ) -> Result<String> {
        let id = session_id.map(str::to_string).unwrap_or_else(new_id);

        sqlx::query(
            r#"
            INSERT OR IGNORE INTO sessions (id, user_email, start_time)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(user_email)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::write("create_session"))?;

        Ok(id)
    }

    async fn log_message(
        &self,
        session_id: &str,
        content: &str,
        sender: Sender,
        category: Option<&str>,
    ) -> Result<String> {
        let id = new_id();

        sqlx::query(
            r#"
            INSERT INTO messages (id, session_id, content, sender, category, timestamp)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(session_id)
        .bind(content)
        .bind(sender.as_str())
        .bind(category)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::write("log_message"))?;

        Ok(id)
    }

    async fn end_session(&self, session_id: &str, feedback: Option<&Feedback>) -> Result<()> {
        let query = match feedback {
            Some(feedback) => sqlx::query(
                r#"
                UPDATE sessions
                SET end_time = ?, feedback_rating = ?, feedback_comments = ?, feedback_helpful = ?
                WHERE id = ?
                "#,
            )
            .bind(Utc::now())
            .bind(feedback.rating)
            .bind(feedback.comments.as_deref())
            .bind(feedback.helpful)
            .bind(session_id),
            None => sqlx::query(
                r#"
                UPDATE sessions
                SET end_time = ?
                WHERE id = ?
                "#,
            )
            .bind(Utc::now())
            .bind(session_id),
        };

        let result = query
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::write("end_session"))?;

        if result.rows_affected() == 0 {
            tracing::debug!(session_id, "end_session matched no session");
        }

        Ok(())
    }

    async fn log_unknown_question(&self, session_id: &str, question: &str) -> Result<String> {
        let id = new_id();

        sqlx::query(
            r#"
            INSERT INTO unknown_questions (id, session_id, question, timestamp)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(session_id)
        .bind(question)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::write("log_unknown_question"))?;

        Ok(id)
    }

    async fn log_inappropriate_content(
        &self,
        session_id: &str,
        content: &str,
        source_address: Option<&str>,
    ) -> Result<String> {
        let id = new_id();

        sqlx::query(
            r#"
            INSERT INTO inappropriate_logs (id, session_id, content, user_ip, timestamp)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(session_id)
        .bind(content)
        .bind(source_address)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::write("log_inappropriate_content"))?;

        Ok(id)
    }

    async fn mark_question_reviewed(&self, question_id: &str) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE unknown_questions
            SET reviewed = 1
            WHERE id = ?
            "#,
        )
        .bind(question_id)
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::write("mark_question_reviewed"))?;

        Ok(result.rows_affected() > 0)
    }

    async fn get_session_logs(&self, limit: u32) -> Result<Vec<SessionLog>> {
        sqlx::query_as::<_, SessionLog>(
            r#"
            SELECT s.id, s.user_email, s.start_time, s.end_time,
                   s.feedback_rating, s.feedback_comments, s.feedback_helpful,
                   COUNT(m.id) AS message_count
            FROM sessions s
            LEFT JOIN messages m ON m.session_id = s.id
            GROUP BY s.id
            ORDER BY s.start_time DESC
            LIMIT ?
            "#,
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::read("get_session_logs"))
    }

    async fn get_unknown_questions(&self, reviewed: bool) -> Result<Vec<UnknownQuestion>> {
        sqlx::query_as::<_, UnknownQuestion>(
            r#"
            SELECT id, session_id, question, timestamp, reviewed
            FROM unknown_questions
            WHERE reviewed = ?
            ORDER BY timestamp DESC
            "#,
        )
        .bind(reviewed)
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::read("get_unknown_questions"))
    }

    async fn get_all_messages(&self) -> Result<Vec<Message>> {
        sqlx::query_as::<_, Message>(
            r#"
            SELECT id, session_id, content, sender, category, timestamp
            FROM messages
            ORDER BY timestamp DESC
            LIMIT ?
            "#,
        )
        .bind(ALL_MESSAGES_LIMIT)
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::read("get_all_messages"))
    }

    async fn get_session_messages(&self, session_id: &str, limit: u32) -> Result<Vec<Message>> {
        sqlx::query_as::<_, Message>(
            r#"
            SELECT id, session_id, content, sender, category, timestamp
            FROM messages
            WHERE session_id = ?
            ORDER BY timestamp ASC
            LIMIT ?
            "#,
        )
        .bind(session_id)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::read("get_session_messages"))
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
