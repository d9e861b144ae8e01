//! Database models.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::DatabaseError;

/// Who wrote a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

impl Sender {
    /// Stored column value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::Bot => "bot",
        }
    }
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sender {
    type Err = DatabaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Sender::User),
            "bot" => Ok(Sender::Bot),
            other => Err(DatabaseError::InvalidSender(other.to_string())),
        }
    }
}

impl TryFrom<String> for Sender {
    type Error = DatabaseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// One continuous chat conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Session {
    /// Opaque session ID (caller-supplied or a generated UUID).
    pub id: String,
    /// User identifier, usually an email.
    pub user_email: Option<String>,
    /// Set once at creation.
    pub start_time: DateTime<Utc>,
    /// Set when the session is ended.
    pub end_time: Option<DateTime<Utc>>,
    /// Feedback rating, 1 to 5.
    pub feedback_rating: Option<i32>,
    /// Free-text feedback.
    pub feedback_comments: Option<String>,
    /// Whether the user found the conversation helpful.
    pub feedback_helpful: Option<bool>,
}

/// A session row annotated with its message count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct SessionLog {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub session: Session,
    /// Number of messages (any sender) in the session.
    pub message_count: i64,
}

/// One turn within a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Message {
    pub id: String,
    pub session_id: String,
    pub content: String,
    #[sqlx(try_from = "String")]
    pub sender: Sender,
    /// Category label, normally only present on bot messages.
    pub category: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// A user question the assistant likely failed to answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct UnknownQuestion {
    pub id: String,
    pub session_id: String,
    pub question: String,
    pub timestamp: DateTime<Utc>,
    /// Set by an admin once the question has been looked at.
    pub reviewed: bool,
}

/// Feedback submitted when a session ends.
///
/// When present, all three columns are written, so omitted fields are
/// stored as NULL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feedback {
    pub rating: Option<i32>,
    pub comments: Option<String>,
    pub helpful: Option<bool>,
}
