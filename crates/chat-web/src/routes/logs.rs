//! Feedback and the admin log viewer.

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use chat_core::validation::{reject_nul, validate_feedback, validate_session_id};
use database::{Feedback, Message, SessionLog, UnknownQuestion};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use tracing::info;

use crate::error::{Result, WebError};
use crate::state::AppState;

/// Default and maximum rows for the session list.
const SESSION_LOGS_DEFAULT: u32 = 100;
const SESSION_LOGS_MAX: u32 = 1000;

/// Default and maximum rows for one session's messages.
const SESSION_MESSAGES_DEFAULT: u32 = 20;
const SESSION_MESSAGES_MAX: u32 = 500;

#[derive(Deserialize)]
pub struct FeedbackRequest {
    #[serde(default)]
    pub session_id: String,
    pub feedback: Option<Feedback>,
}

#[derive(Serialize)]
pub struct Ack {
    pub success: bool,
    pub message: String,
}

#[derive(Deserialize)]
pub struct LimitQuery {
    pub limit: Option<u32>,
}

#[derive(Deserialize)]
pub struct ReviewedQuery {
    #[serde(default)]
    pub reviewed: bool,
}

/// End a session with the user's feedback.
pub async fn feedback(
    State(state): State<AppState>,
    Json(req): Json<FeedbackRequest>,
) -> Result<Json<Ack>> {
    let session_id = req.session_id.trim();
    let Some(feedback) = req.feedback.filter(|_| !session_id.is_empty()) else {
        return Err(WebError::BadRequest(
            "Session ID and feedback are required".to_string(),
        ));
    };
    validate_session_id(session_id)?;
    validate_feedback(&feedback)?;

    state.db().end_session(session_id, Some(&feedback)).await?;
    info!(session_id, rating = ?feedback.rating, "Feedback recorded");

    Ok(Json(Ack {
        success: true,
        message: "Feedback recorded".to_string(),
    }))
}

/// Sessions newest first with message counts.
pub async fn session_logs(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<SessionLog>>> {
    authorize(&state, &headers)?;
    let limit = query
        .limit
        .unwrap_or(SESSION_LOGS_DEFAULT)
        .min(SESSION_LOGS_MAX);
    Ok(Json(state.db().get_session_logs(limit).await?))
}

/// One session's messages in conversation order.
pub async fn session_messages(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(session_id): Path<String>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<Message>>> {
    authorize(&state, &headers)?;
    validate_session_id(&session_id)?;
    let limit = query
        .limit
        .unwrap_or(SESSION_MESSAGES_DEFAULT)
        .min(SESSION_MESSAGES_MAX);
    Ok(Json(state.db().get_session_messages(&session_id, limit).await?))
}

/// The latest messages across all sessions.
pub async fn all_messages(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<Message>>> {
    authorize(&state, &headers)?;
    Ok(Json(state.db().get_all_messages().await?))
}

/// Flagged questions by review state (pending by default).
pub async fn unknown_questions(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ReviewedQuery>,
) -> Result<Json<Vec<UnknownQuestion>>> {
    authorize(&state, &headers)?;
    Ok(Json(state.db().get_unknown_questions(query.reviewed).await?))
}

/// Mark a flagged question as reviewed.
pub async fn review_question(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(question_id): Path<String>,
) -> Result<Json<Ack>> {
    authorize(&state, &headers)?;
    reject_nul("question ID", &question_id)?;

    if !state.db().mark_question_reviewed(&question_id).await? {
        return Err(WebError::NotFound(format!(
            "Unknown question not found: {question_id}"
        )));
    }
    info!(question_id = %question_id, "Question marked reviewed");

    Ok(Json(Ack {
        success: true,
        message: "Question marked reviewed".to_string(),
    }))
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<()> {
    let Some(expected) = state.admin_token.as_deref() else {
        return Err(WebError::Forbidden("Admin log viewer is disabled".to_string()));
    };

    let token = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.strip_prefix("Bearer ").unwrap_or(value));

    let authorized = token
        .map(|token| bool::from(token.as_bytes().ct_eq(expected.as_bytes())))
        .unwrap_or(false);
    if !authorized {
        return Err(WebError::Unauthorized("Invalid admin token".to_string()));
    }

    Ok(())
}
