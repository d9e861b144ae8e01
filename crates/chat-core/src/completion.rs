//! The completion service the chat endpoint asks for replies.
//!
//! Model clients live outside this workspace; anything that turns a prompt
//! into text can implement [`Completion`].

use async_trait::async_trait;
use thiserror::Error;

use crate::category::Category;

/// Errors from a completion service.
#[derive(Debug, Error)]
pub enum CompletionError {
    /// The service could not be reached or refused the request.
    #[error("completion service unavailable: {0}")]
    Unavailable(String),

    /// The service answered without usable text.
    #[error("empty completion")]
    Empty,
}

/// What the completion service gets for one turn.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub session_id: String,
    pub message: String,
    pub category: Category,
    pub user_email: Option<String>,
}

/// Produces a reply for a user message.
#[async_trait]
pub trait Completion: Send + Sync {
    /// Generate a reply.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError>;

    /// Get a human-readable name for this implementation.
    fn name(&self) -> &str;
}

/// Reply used when no model is wired in.
pub const DEFAULT_CANNED_REPLY: &str =
    "I'm not sure about that one yet. Please contact the store directly and they'll be happy to help!";

/// A completion service that always answers with the same text.
#[derive(Debug, Clone)]
pub struct CannedCompletion {
    reply: String,
}

impl CannedCompletion {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
        }
    }
}

impl Default for CannedCompletion {
    fn default() -> Self {
        Self::new(DEFAULT_CANNED_REPLY)
    }
}

#[async_trait]
impl Completion for CannedCompletion {
    async fn complete(&self, _request: &CompletionRequest) -> Result<String, CompletionError> {
        Ok(self.reply.clone())
    }

    fn name(&self) -> &str {
        "CannedCompletion"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CompletionRequest {
        CompletionRequest {
            session_id: "s1".to_string(),
            message: "hi".to_string(),
            category: Category::General,
            user_email: None,
        }
    }

    #[tokio::test]
    async fn test_canned_reply() {
        let completion = CannedCompletion::new("We open at noon.");
        assert_eq!(completion.complete(&request()).await.unwrap(), "We open at noon.");
        assert_eq!(completion.name(), "CannedCompletion");
    }

    #[tokio::test]
    async fn test_default_reply_reads_as_unanswered() {
        let reply = CannedCompletion::default().complete(&request()).await.unwrap();
        assert!(crate::category::looks_unanswered(&reply));
    }
}
