//! The storage contract shared by every backend.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::Result;
use crate::models::{Feedback, Message, Sender, SessionLog, UnknownQuestion};

/// Row cap for [`ChatStore::get_all_messages`].
pub const ALL_MESSAGES_LIMIT: i64 = 100;

/// Which backend is serving requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Sqlite,
    Postgres,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Sqlite => "sqlite",
            BackendKind::Postgres => "postgres",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Connection pool limits for the networked backend.
#[derive(Debug, Clone)]
pub struct PoolSettings {
    pub max_connections: u32,
    /// Idle connections are closed after this long.
    pub idle_timeout: Duration,
    /// How long to wait for a free connection before failing.
    pub acquire_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 20,
            idle_timeout: Duration::from_secs(30),
            acquire_timeout: Duration::from_secs(2),
        }
    }
}

/// Bounded retries for transient read/write failures. Disabled by default.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Extra attempts after the first failure.
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each further attempt.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::from_millis(100),
        }
    }
}

/// Everything backend selection needs.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// PostgreSQL connection string. Empty or absent selects SQLite.
    pub database_url: Option<String>,
    /// Directory holding the SQLite file.
    pub data_dir: PathBuf,
    pub pool: PoolSettings,
    pub retry: RetryPolicy,
}

impl StoreConfig {
    /// Embedded-only configuration rooted at `data_dir`.
    pub fn embedded(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            database_url: None,
            data_dir: data_dir.into(),
            pool: PoolSettings::default(),
            retry: RetryPolicy::default(),
        }
    }

    /// The networked connection string, if one is set and non-blank.
    pub fn networked_url(&self) -> Option<&str> {
        self.database_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }
}

/// Session and message persistence.
///
/// Implemented once per backend. Every method is a self-contained unit of
/// work; nothing here spans calls or holds locks.
#[async_trait]
pub trait ChatStore: Send + Sync {
    /// Which backend this is.
    fn kind(&self) -> BackendKind;

    /// Create the four tables if they do not exist.
    async fn initialize(&self) -> Result<()>;

    /// Create a session, generating an ID when none is given.
    ///
    /// An existing ID is left untouched and returned.
    async fn create_session(
        &self,
        user_email: Option<&str>,
        session_id: Option<&str>,
    ) -> Result<String>;

    /// Append a message and return its generated ID.
    ///
    /// The session is not required to exist.
    async fn log_message(
        &self,
        session_id: &str,
        content: &str,
        sender: Sender,
        category: Option<&str>,
    ) -> Result<String>;

    /// Stamp the end time and, if given, the feedback.
    ///
    /// Unknown session IDs are ignored.
    async fn end_session(&self, session_id: &str, feedback: Option<&Feedback>) -> Result<()>;

    /// Record a question the assistant could not answer.
    async fn log_unknown_question(&self, session_id: &str, question: &str) -> Result<String>;

    /// Record a message flagged as out of policy.
    async fn log_inappropriate_content(
        &self,
        session_id: &str,
        content: &str,
        source_address: Option<&str>,
    ) -> Result<String>;

    /// Mark a flagged question as reviewed. Returns `false` if no row matched.
    async fn mark_question_reviewed(&self, question_id: &str) -> Result<bool>;

    /// Sessions newest first, each with its message count.
    async fn get_session_logs(&self, limit: u32) -> Result<Vec<SessionLog>>;

    /// Flagged questions with the given review state, newest first.
    async fn get_unknown_questions(&self, reviewed: bool) -> Result<Vec<UnknownQuestion>>;

    /// The latest [`ALL_MESSAGES_LIMIT`] messages across all sessions, newest first.
    async fn get_all_messages(&self) -> Result<Vec<Message>>;

    /// One session's messages in conversation order.
    async fn get_session_messages(&self, session_id: &str, limit: u32) -> Result<Vec<Message>>;

    /// Close the underlying pool.
    async fn close(&self) {}
}

/// Fresh row identifier.
pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
