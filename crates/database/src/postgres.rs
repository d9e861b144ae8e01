//! Networked PostgreSQL backend.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::error::{DatabaseError, Result};
use crate::models::{Feedback, Message, Sender, SessionLog, UnknownQuestion};
use crate::store::{new_id, BackendKind, ChatStore, PoolSettings, ALL_MESSAGES_LIMIT};

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS sessions (
        id TEXT PRIMARY KEY,
        user_email TEXT,
        start_time TIMESTAMPTZ NOT NULL,
        end_time TIMESTAMPTZ,
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
        timestamp TIMESTAMPTZ NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS unknown_questions (
        id TEXT PRIMARY KEY,
        session_id TEXT NOT NULL,
        question TEXT NOT NULL,
        timestamp TIMESTAMPTZ NOT NULL,
        reviewed BOOLEAN NOT NULL DEFAULT FALSE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS inappropriate_logs (
        id TEXT PRIMARY KEY,
        session_id TEXT NOT NULL,
        content TEXT NOT NULL,
        user_ip TEXT,
        timestamp TIMESTAMPTZ NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_messages_session ON messages (session_id, timestamp)",
];

/// PostgreSQL-backed store over a bounded connection pool.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Connect to PostgreSQL.
    ///
    /// Fails if the URL is malformed or no connection can be established
    /// within the acquire timeout.
    pub async fn connect(url: &str, settings: &PoolSettings) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .idle_timeout(settings.idle_timeout)
            .acquire_timeout(settings.acquire_timeout)
            .connect(url)
            .await
            .map_err(DatabaseError::unavailable(BackendKind::Postgres))?;

        tracing::info!(
            max_connections = settings.max_connections,
            "Connected to PostgreSQL"
        );

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl ChatStore for PostgresStore {
    fn kind(&self) -> BackendKind {
        BackendKind::Postgres
    }

    async fn initialize(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(DatabaseError::unavailable(BackendKind::Postgres))?;
        }

        tracing::debug!("PostgreSQL tables initialized");
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
            INSERT INTO sessions (id, user_email, start_time)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO NOTHING
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
            VALUES ($1, $2, $3, $4, $5, $6)
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
                SET end_time = $2, feedback_rating = $3, feedback_comments = $4, feedback_helpful = $5
                WHERE id = $1
                "#,
            )
            .bind(session_id)
            .bind(Utc::now())
            .bind(feedback.rating)
            .bind(feedback.comments.as_deref())
            .bind(feedback.helpful),
            None => sqlx::query(
                r#"
                UPDATE sessions
                SET end_time = $2
                WHERE id = $1
                "#,
            )
            .bind(session_id)
            .bind(Utc::now()),
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
            VALUES ($1, $2, $3, $4)
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
            VALUES ($1, $2, $3, $4, $5)
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
            SET reviewed = TRUE
            WHERE id = $1
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
            LIMIT $1
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
            WHERE reviewed = $1
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
            LIMIT $1
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
            WHERE session_id = $1
            ORDER BY timestamp ASC
            LIMIT $2
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
