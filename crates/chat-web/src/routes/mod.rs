//! Route handlers for the chat web service.

pub mod auth;
pub mod chat;
pub mod health;
pub mod logs;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

/// Build the router with all routes.
pub fn router() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/api/health", get(health::health))
        // Chat widget
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/chat", post(chat::chat))
        .route("/api/logs/feedback", post(logs::feedback))
        // Admin log viewer
        .route("/api/logs/sessions", get(logs::session_logs))
        .route("/api/logs/sessions/:id/messages", get(logs::session_messages))
        .route("/api/logs/messages", get(logs::all_messages))
        .route("/api/logs/unknown-questions", get(logs::unknown_questions))
        .route(
            "/api/logs/unknown-questions/:id/review",
            post(logs::review_question),
        )
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::Router;
    use chat_core::{ActionLinks, CannedCompletion, Completion};
    use database::{ChatStore, Database, SqliteStore};
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::state::AppState;

    pub const ADMIN_TOKEN: &str = "test-token";
    pub const MENU_URL: &str = "https://shop.test/menu";

    pub async fn test_state_with(completion: Arc<dyn Completion>) -> AppState {
        let store = SqliteStore::in_memory().await.unwrap();
        store.initialize().await.unwrap();
        AppState::new(
            Database::with_store(Arc::new(store)),
            completion,
            vec!["a@x.com".to_string()],
            Some(ADMIN_TOKEN.to_string()),
            ActionLinks {
                menu: Some(MENU_URL.to_string()),
                ..ActionLinks::default()
            },
        )
    }

    pub async fn test_state() -> AppState {
        test_state_with(Arc::new(CannedCompletion::default())).await
    }

    pub fn app(state: AppState) -> Router {
        super::router().with_state(state)
    }

    pub fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    pub fn admin_get(uri: &str) -> Request<Body> {
        Request::get(uri)
            .header("authorization", format!("Bearer {ADMIN_TOKEN}"))
            .body(Body::empty())
            .unwrap()
    }

    pub async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }
}
