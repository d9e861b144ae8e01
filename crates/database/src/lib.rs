//! Chat session logging for the support chat service.
//!
//! Sessions, messages and flagged interactions are stored through the
//! [`ChatStore`] contract, which has a PostgreSQL and a SQLite
//! implementation. [`Database`] picks one at startup: PostgreSQL when a
//! connection string is configured and reachable, SQLite otherwise.
//!
//! # Example
//!
//! ```no_run
//! use database::{Database, Sender, StoreConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Falls back to data/chatbot.db when DATABASE_URL is unset or unreachable
//!     let mut config = StoreConfig::embedded("data");
//!     config.database_url = std::env::var("DATABASE_URL").ok();
//!     let db = Database::connect(&config).await?;
//!
//!     let session_id = db.create_session(Some("a@x.com"), None).await?;
//!     db.log_message(&session_id, "hi", Sender::User, None).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod models;
pub mod postgres;
pub mod retry;
pub mod sqlite;
pub mod store;

pub use error::{DatabaseError, Result};
pub use models::{Feedback, Message, Sender, Session, SessionLog, UnknownQuestion};
pub use postgres::PostgresStore;
pub use retry::RetryingStore;
pub use sqlite::SqliteStore;
pub use store::{BackendKind, ChatStore, PoolSettings, RetryPolicy, StoreConfig};

use std::fmt;
use std::sync::{Arc, OnceLock};

/// Handle to the active storage backend.
///
/// Cheap to clone; clones share the same backend. A handle created with
/// [`Database::new`] rejects every call with [`DatabaseError::NotInitialized`]
/// until [`Database::initialize`] has selected a backend.
#[derive(Clone, Default)]
pub struct Database {
    active: Arc<OnceLock<Arc<dyn ChatStore>>>,
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("backend", &self.backend_kind())
            .finish()
    }
}

impl Database {
    /// Create an uninitialized handle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Select a backend and return an initialized handle.
    pub async fn connect(config: &StoreConfig) -> Result<Self> {
        let db = Self::new();
        db.initialize(config).await?;
        Ok(db)
    }

    /// Wrap a store that has already been initialized.
    pub fn with_store(store: Arc<dyn ChatStore>) -> Self {
        let active = OnceLock::new();
        let _ = active.set(store);
        Self {
            active: Arc::new(active),
        }
    }

    /// Run backend selection and make the winner active.
    ///
    /// Calling this on an initialized handle keeps the existing backend.
    pub async fn initialize(&self, config: &StoreConfig) -> Result<BackendKind> {
        if let Some(kind) = self.backend_kind() {
            tracing::warn!(backend = %kind, "Database already initialized");
            return Ok(kind);
        }

        let mut store = select_backend(config).await?;
        if config.retry.max_retries > 0 {
            store = Arc::new(RetryingStore::new(store, config.retry.clone()));
        }

        if let Err(loser) = self.active.set(store) {
            tracing::warn!("Database initialized concurrently, discarding second backend");
            loser.close().await;
        }

        self.backend_kind().ok_or(DatabaseError::NotInitialized)
    }

    /// The active backend, if one has been selected.
    pub fn backend_kind(&self) -> Option<BackendKind> {
        self.active.get().map(|store| store.kind())
    }

    fn store(&self) -> Result<&Arc<dyn ChatStore>> {
        self.active.get().ok_or(DatabaseError::NotInitialized)
    }

    /// Create a session, or return the given ID unchanged if it exists.
    pub async fn create_session(
        &self,
        user_email: Option<&str>,
        session_id: Option<&str>,
    ) -> Result<String> {
        self.store()?.create_session(user_email, session_id).await
    }

    /// Append a message to a session.
    pub async fn log_message(
        &self,
        session_id: &str,
        content: &str,
        sender: Sender,
        category: Option<&str>,
    ) -> Result<String> {
        self.store()?
            .log_message(session_id, content, sender, category)
            .await
    }

    /// End a session, optionally recording feedback.
    pub async fn end_session(&self, session_id: &str, feedback: Option<&Feedback>) -> Result<()> {
        self.store()?.end_session(session_id, feedback).await
    }

    pub async fn log_unknown_question(&self, session_id: &str, question: &str) -> Result<String> {
        self.store()?.log_unknown_question(session_id, question).await
    }

    pub async fn log_inappropriate_content(
        &self,
        session_id: &str,
        content: &str,
        source_address: Option<&str>,
    ) -> Result<String> {
        self.store()?
            .log_inappropriate_content(session_id, content, source_address)
            .await
    }

    pub async fn mark_question_reviewed(&self, question_id: &str) -> Result<bool> {
        self.store()?.mark_question_reviewed(question_id).await
    }

    pub async fn get_session_logs(&self, limit: u32) -> Result<Vec<SessionLog>> {
        self.store()?.get_session_logs(limit).await
    }

    pub async fn get_unknown_questions(&self, reviewed: bool) -> Result<Vec<UnknownQuestion>> {
        self.store()?.get_unknown_questions(reviewed).await
    }

    pub async fn get_all_messages(&self) -> Result<Vec<Message>> {
        self.store()?.get_all_messages().await
    }

    pub async fn get_session_messages(&self, session_id: &str, limit: u32) -> Result<Vec<Message>> {
        self.store()?.get_session_messages(session_id, limit).await
    }

    /// Close the active backend's pool.
    pub async fn close(&self) {
        if let Some(store) = self.active.get() {
            store.close().await;
        }
    }
}

/// Pick a backend: PostgreSQL if configured and healthy, otherwise SQLite.
///
/// A PostgreSQL failure is logged and ignored. A SQLite failure is fatal.
pub async fn select_backend(config: &StoreConfig) -> Result<Arc<dyn ChatStore>> {
    match config.networked_url() {
        Some(url) => {
            tracing::info!("Attempting PostgreSQL connection");
            match open_postgres(url, &config.pool).await {
                Ok(store) => {
                    tracing::info!(backend = %BackendKind::Postgres, "Using PostgreSQL database");
                    return Ok(Arc::new(store));
                }
                Err(err) => {
                    tracing::warn!(error = %err, "PostgreSQL unavailable, falling back to SQLite");
                }
            }
        }
        None => tracing::info!("No DATABASE_URL configured, using SQLite"),
    }

    let store = SqliteStore::open(&config.data_dir)
        .await
        .inspect_err(|err| tracing::error!(error = %err, "SQLite unavailable"))?;
    store
        .initialize()
        .await
        .inspect_err(|err| tracing::error!(error = %err, "SQLite schema setup failed"))?;

    tracing::info!(backend = %BackendKind::Sqlite, "Using SQLite database");
    Ok(Arc::new(store))
}

async fn open_postgres(url: &str, pool: &PoolSettings) -> Result<PostgresStore> {
    let store = PostgresStore::connect(url, pool).await?;
    if let Err(err) = store.initialize().await {
        store.close().await;
        return Err(err);
    }
    Ok(store)
}
