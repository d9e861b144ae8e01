//! Retry wrapper around another store.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;

use crate::error::Result;
use crate::models::{Feedback, Message, Sender, SessionLog, UnknownQuestion};
use crate::store::{BackendKind, ChatStore, RetryPolicy};

/// A store that retries transient read/write failures of another store.
///
/// Writes that generate an ID get a fresh ID on each attempt, so a write that
/// committed but reported failure can be duplicated.
/// Upper bound on the wait between two attempts.
pub const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

pub struct RetryingStore {
    inner: Arc<dyn ChatStore>,
    policy: RetryPolicy,
}

impl RetryingStore {
    pub fn new(inner: Arc<dyn ChatStore>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    /// Delay before retry number `attempt + 1`: doubling from the base, capped.
    fn backoff(&self, attempt: u32) -> Duration {
        self.policy
            .base_delay
            .checked_mul(2u32.saturating_pow(attempt))
            .map_or(MAX_RETRY_DELAY, |delay| delay.min(MAX_RETRY_DELAY))
    }

    async fn run<T, F, Fut>(&self, operation: &'static str, mut call: F) -> Result<T>
    where
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = Result<T>> + Send,
        T: Send,
    {
        let mut attempt = 0;
        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() && attempt < self.policy.max_retries => {
                    let delay = self.backoff(attempt);
                    attempt += 1;
                    tracing::warn!(
                        operation,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Retrying store operation"
                    );
                    sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[async_trait]
impl ChatStore for RetryingStore {
    fn kind(&self) -> BackendKind {
        self.inner.kind()
    }

    async fn initialize(&self) -> Result<()> {
        self.inner.initialize().await
    }

    async fn create_session(
        &self,
        user_email: Option<&str>,
        session_id: Option<&str>,
    ) -> Result<String> {
        // Pin the ID so a retry cannot create a second session.
        let id = match session_id {
            Some(id) => id.to_string(),
            None => crate::store::new_id(),
        };
        self.run("create_session", || {
            self.inner.create_session(user_email, Some(id.as_str()))
        })
        .await
    }

    async fn log_message(
        &self,
        session_id: &str,
        content: &str,
        sender: Sender,
        category: Option<&str>,
    ) -> Result<String> {
        self.run("log_message", || {
            self.inner.log_message(session_id, content, sender, category)
        })
        .await
    }

    async fn end_session(&self, session_id: &str, feedback: Option<&Feedback>) -> Result<()> {
        self.run("end_session", || self.inner.end_session(session_id, feedback))
            .await
    }

    async fn log_unknown_question(&self, session_id: &str, question: &str) -> Result<String> {
        self.run("log_unknown_question", || {
            self.inner.log_unknown_question(session_id, question)
        })
        .await
    }

    async fn log_inappropriate_content(
        &self,
        session_id: &str,
        content: &str,
        source_address: Option<&str>,
    ) -> Result<String> {
        self.run("log_inappropriate_content", || {
            self.inner
                .log_inappropriate_content(session_id, content, source_address)
        })
        .await
    }

    async fn mark_question_reviewed(&self, question_id: &str) -> Result<bool> {
        self.run("mark_question_reviewed", || {
            self.inner.mark_question_reviewed(question_id)
        })
        .await
    }

    async fn get_session_logs(&self, limit: u32) -> Result<Vec<SessionLog>> {
        self.run("get_session_logs", || self.inner.get_session_logs(limit))
            .await
    }

    async fn get_unknown_questions(&self, reviewed: bool) -> Result<Vec<UnknownQuestion>> {
        self.run("get_unknown_questions", || {
            self.inner.get_unknown_questions(reviewed)
        })
        .await
    }

    async fn get_all_messages(&self) -> Result<Vec<Message>> {
        self.run("get_all_messages", || self.inner.get_all_messages())
            .await
    }

    async fn get_session_messages(&self, session_id: &str, limit: u32) -> Result<Vec<Message>> {
        self.run("get_session_messages", || {
            self.inner.get_session_messages(session_id, limit)
        })
        .await
    }

    async fn close(&self) {
        self.inner.close().await
    }
}
