//! Chat turn handling for the support chat service.
//!
//! - [`category`] - keyword categorization of user messages and follow-up actions
//! - [`completion`] - the reply-producing service contract
//! - [`recorder`] - the per-turn write sequence against the store
//! - [`validation`] - request and feedback checks
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use chat_core::{CannedCompletion, ChatRecorder, ChatTurn};
//! use database::{Database, StoreConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect(&StoreConfig::embedded("data")).await?;
//!     let recorder = ChatRecorder::new(db, Arc::new(CannedCompletion::default()));
//!
//!     let reply = recorder
//!         .record_turn(&ChatTurn {
//!             session_id: "s1".to_string(),
//!             message: "When do you open?".to_string(),
//!             user_email: None,
//!             source_address: None,
//!         })
//!         .await?;
//!     println!("{} ({})", reply.response, reply.category);
//!     Ok(())
//! }
//! ```

pub mod category;
pub mod completion;
pub mod recorder;
pub mod validation;

pub use category::{actions_for, categorize, looks_unanswered, Action, ActionKind, ActionLinks, Category};
pub use completion::{CannedCompletion, Completion, CompletionError, CompletionRequest};
pub use recorder::{ChatRecorder, ChatReply, ChatTurn, TurnError, FALLBACK_REPLY, POLICY_REPLY};
pub use validation::ValidationError;
