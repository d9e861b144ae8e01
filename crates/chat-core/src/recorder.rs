//! Records one chat turn: session, user message, reply, and flags.

use std::sync::Arc;

use database::{Database, DatabaseError, Sender};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::category::{actions_for, categorize, looks_unanswered, Action, ActionLinks, Category};
use crate::completion::{Completion, CompletionError, CompletionRequest};
use crate::validation::{validate_email, validate_message, validate_session_id, ValidationError};

/// Reply to out-of-policy messages. The completion service is not called.
pub const POLICY_REPLY: &str = "Oops! I'm just here to help with questions about the shop, so let's keep things sweet and friendly. What can I help you with?";

/// Reply shown to the user when a turn has to be abandoned.
pub const FALLBACK_REPLY: &str =
    "Sorry, I'm having a brain freeze right now! Please try asking me again in a moment.";

/// An inbound chat message.
#[derive(Debug, Clone)]
pub struct ChatTurn {
    pub session_id: String,
    pub message: String,
    pub user_email: Option<String>,
    /// Caller's network address, recorded with flagged content.
    pub source_address: Option<String>,
}

/// The reply for a turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatReply {
    pub response: String,
    pub category: Category,
    /// Follow-up buttons for the reply's category.
    pub actions: Vec<Action>,
}

impl ChatReply {
    /// The generic reply for an abandoned turn.
    pub fn fallback() -> Self {
        Self {
            response: FALLBACK_REPLY.to_string(),
            category: Category::General,
            actions: Vec::new(),
        }
    }
}

/// Failures that abandon a turn.
#[derive(Debug, Error)]
pub enum TurnError {
    #[error("invalid message: {0}")]
    Invalid(#[from] ValidationError),

    #[error("could not open session: {0}")]
    Session(#[source] DatabaseError),

    #[error("could not record user message: {0}")]
    UserMessage(#[source] DatabaseError),

    #[error(transparent)]
    Completion(#[from] CompletionError),
}

/// Runs the per-turn write sequence against the store.
///
/// Steps are independent writes. Only a failure to open the session or to
/// record the user's message abandons the turn; later failures are logged
/// and the reply is still returned.
#[derive(Clone)]
pub struct ChatRecorder {
    db: Database,
    completion: Arc<dyn Completion>,
    links: Arc<ActionLinks>,
}

impl ChatRecorder {
    pub fn new(db: Database, completion: Arc<dyn Completion>) -> Self {
        Self {
            db,
            completion,
            links: Arc::new(ActionLinks::default()),
        }
    }

    /// Attach the URLs used for follow-up actions.
    pub fn with_action_links(mut self, links: ActionLinks) -> Self {
        self.links = Arc::new(links);
        self
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Record a turn and produce its reply.
    pub async fn record_turn(&self, turn: &ChatTurn) -> Result<ChatReply, TurnError> {
        validate_session_id(&turn.session_id)?;
        validate_message(&turn.message)?;
        if let Some(email) = &turn.user_email {
            validate_email(email)?;
        }
        let session_id = turn.session_id.as_str();

        self.db
            .create_session(turn.user_email.as_deref(), Some(session_id))
            .await
            .map_err(|err| {
                error!(session_id, error = %err, "Failed to open session");
                TurnError::Session(err)
            })?;

        self.db
            .log_message(session_id, &turn.message, Sender::User, None)
            .await
            .map_err(|err| {
                error!(session_id, error = %err, "Failed to record user message");
                TurnError::UserMessage(err)
            })?;

        let category = categorize(&turn.message);
        let response = match category {
            Category::Inappropriate => POLICY_REPLY.to_string(),
            _ => self.complete(turn, category).await?,
        };

        if let Err(err) = self
            .db
            .log_message(session_id, &response, Sender::Bot, Some(category.as_str()))
            .await
        {
            warn!(session_id, error = %err, "Failed to record bot message");
        }

        if category == Category::Inappropriate {
            debug!(session_id, "Flagging inappropriate message");
            if let Err(err) = self
                .db
                .log_inappropriate_content(session_id, &turn.message, turn.source_address.as_deref())
                .await
            {
                warn!(session_id, error = %err, "Failed to record inappropriate content");
            }
        }

        if category == Category::General && looks_unanswered(&response) {
            debug!(session_id, "Flagging unanswered question");
            if let Err(err) = self.db.log_unknown_question(session_id, &turn.message).await {
                warn!(session_id, error = %err, "Failed to record unknown question");
            }
        }

        let actions = match category {
            Category::Inappropriate => Vec::new(),
            _ => actions_for(category, &self.links),
        };

        Ok(ChatReply {
            response,
            category,
            actions,
        })
    }

    async fn complete(&self, turn: &ChatTurn, category: Category) -> Result<String, CompletionError> {
        let request = CompletionRequest {
            session_id: turn.session_id.clone(),
            message: turn.message.clone(),
            category,
            user_email: turn.user_email.clone(),
        };

        let response = self.completion.complete(&request).await.map_err(|err| {
            error!(
                session_id = %turn.session_id,
                completion = self.completion.name(),
                error = %err,
                "Completion failed"
            );
            err
        })?;

        // PostgreSQL rejects NUL in text columns
        let response = response.replace('\0', "");
        let response = response.trim();
        if response.is_empty() {
            return Err(CompletionError::Empty);
        }
        Ok(response.to_string())
    }
}
