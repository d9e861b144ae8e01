//! Application state shared across handlers.

use std::sync::Arc;

use chat_core::{ActionLinks, ChatRecorder, Completion};
use database::Database;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Per-turn write sequence.
    pub recorder: ChatRecorder,
    /// Lowercased login allowlist.
    pub authorized_emails: Arc<Vec<String>>,
    /// Admin bearer token, if admin routes are enabled.
    pub admin_token: Option<Arc<str>>,
}

impl AppState {
    /// Create new application state.
    pub fn new(
        db: Database,
        completion: Arc<dyn Completion>,
        authorized_emails: Vec<String>,
        admin_token: Option<String>,
        action_links: ActionLinks,
    ) -> Self {
        Self {
            recorder: ChatRecorder::new(db, completion).with_action_links(action_links),
            authorized_emails: Arc::new(authorized_emails),
            admin_token: admin_token.map(Arc::from),
        }
    }

    /// The store handle.
    pub fn db(&self) -> &Database {
        self.recorder.database()
    }

    /// Whether `email` may open a session.
    pub fn is_authorized(&self, email: &str) -> bool {
        let email = email.trim().to_lowercase();
        self.authorized_emails.iter().any(|allowed| *allowed == email)
    }
}
