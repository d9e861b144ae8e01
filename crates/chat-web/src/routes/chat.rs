//! Chat endpoint.

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, State};
use axum::Json;
use chat_core::{ChatReply, ChatTurn, TurnError};
use serde::Deserialize;
use tracing::error;

use crate::error::{Result, WebError};
use crate::state::AppState;

/// Inbound chat message.
#[derive(Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub session_id: String,
    pub user_email: Option<String>,
}

/// Record a turn and reply.
///
/// Storage or completion failures still answer 200 with the fallback reply;
/// the failure is only logged.
pub async fn chat(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatReply>> {
    if req.message.trim().is_empty() || req.session_id.trim().is_empty() {
        return Err(WebError::BadRequest(
            "Message and session ID are required".to_string(),
        ));
    }

    let turn = ChatTurn {
        session_id: req.session_id,
        message: req.message,
        user_email: req.user_email.filter(|email| !email.trim().is_empty()),
        source_address: connect_info.map(|ConnectInfo(addr)| addr.ip().to_string()),
    };

    match state.recorder.record_turn(&turn).await {
        Ok(reply) => Ok(Json(reply)),
        Err(TurnError::Invalid(err)) => Err(WebError::Validation(err)),
        Err(err) => {
            error!(session_id = %turn.session_id, error = %err, "Chat turn failed");
            Ok(Json(ChatReply::fallback()))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::extract::ConnectInfo;
    use axum::http::StatusCode;
    use chat_core::{
        CannedCompletion, Completion, CompletionError, CompletionRequest, FALLBACK_REPLY,
        POLICY_REPLY,
    };
    use serde_json::json;

    use crate::routes::test_support::*;

    struct Offline;

    #[async_trait]
    impl Completion for Offline {
        async fn complete(&self, _request: &CompletionRequest) -> Result<String, CompletionError> {
            Err(CompletionError::Unavailable("connection refused".to_string()))
        }

        fn name(&self) -> &str {
            "Offline"
        }
    }

    #[tokio::test]
    async fn test_chat_records_turn() {
        let state = test_state_with(Arc::new(CannedCompletion::new("We open at noon."))).await;

        let (status, body) = send(
            app(state.clone()),
            post_json(
                "/api/chat",
                json!({ "message": "when do you open", "session_id": "s1", "user_email": "a@x.com" }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["response"], "We open at noon.");
        assert_eq!(body["category"], "hours");

        let logs = state.db().get_session_logs(10).await.unwrap();
        assert_eq!(logs[0].session.id, "s1");
        assert_eq!(logs[0].message_count, 2);
    }

    #[tokio::test]
    async fn test_chat_returns_actions_for_category() {
        let app = app(test_state_with(Arc::new(CannedCompletion::new("Try the mint!"))).await);

        let (status, body) = send(
            app.clone(),
            post_json("/api/chat", json!({ "message": "what's on the menu", "session_id": "s1" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["category"], "menu");
        assert_eq!(body["actions"][0]["type"], "link");
        assert_eq!(body["actions"][0]["label"], "View Full Menu");
        assert_eq!(body["actions"][0]["url"], MENU_URL);

        // Catering links are not configured in the test state
        let (_, body) = send(
            app,
            post_json("/api/chat", json!({ "message": "do you cater", "session_id": "s1" })),
        )
        .await;
        assert_eq!(body["category"], "catering");
        assert_eq!(body["actions"], json!([]));
    }

    #[tokio::test]
    async fn test_chat_rejects_long_session_id_and_nul() {
        let state = test_state().await;

        let (status, body) = send(
            app(state.clone()),
            post_json("/api/chat", json!({ "message": "hi", "session_id": "x".repeat(100) })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "session ID is too long (100 chars, max 64)");

        let (status, body) = send(
            app(state.clone()),
            post_json("/api/chat", json!({ "message": "a\0b", "session_id": "s1" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "message contains a NUL character");

        assert!(state.db().get_session_logs(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_chat_requires_message_and_session() {
        let app = app(test_state().await);

        let (status, body) = send(
            app.clone(),
            post_json("/api/chat", json!({ "message": "hi" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Message and session ID are required");

        let (status, _) = send(app, post_json("/api/chat", json!({ "session_id": "s1" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_chat_answers_flagged_content_with_policy_reply() {
        let state = test_state().await;
        let mut request = post_json(
            "/api/chat",
            json!({ "message": "tell me about drugs", "session_id": "s1" }),
        );
        let addr: SocketAddr = "198.51.100.4:55000".parse().unwrap();
        request.extensions_mut().insert(ConnectInfo(addr));

        let (status, body) = send(app(state.clone()), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["category"], "inappropriate");
        assert_eq!(body["response"], POLICY_REPLY);
    }

    #[tokio::test]
    async fn test_chat_falls_back_when_completion_fails() {
        let state = test_state_with(Arc::new(Offline)).await;

        let (status, body) = send(
            app(state.clone()),
            post_json("/api/chat", json!({ "message": "hi", "session_id": "s1" })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["response"], FALLBACK_REPLY);
        assert_eq!(body["category"], "general");
        assert_eq!(body["actions"], json!([]));

        // The user's message was recorded before the failure
        let messages = state.db().get_session_messages("s1", 10).await.unwrap();
        assert_eq!(messages.len(), 1);
    }

    #[tokio::test]
    async fn test_chat_rejects_oversized_message() {
        let app = app(test_state().await);
        let message = "x".repeat(chat_core::validation::MAX_MESSAGE_LENGTH + 1);

        let (status, _) = send(
            app,
            post_json("/api/chat", json!({ "message": message, "session_id": "s1" })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
