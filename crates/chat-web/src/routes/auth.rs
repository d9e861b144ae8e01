//! Login and logout for the chat widget.

use axum::extract::State;
use axum::Json;
use chat_core::validation::validate_email;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Result, WebError};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub message: String,
    pub session_id: String,
}

#[derive(Serialize)]
pub struct LogoutResponse {
    pub success: bool,
    pub message: String,
}

/// Check the email against the allowlist and open a fresh session.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let email = req.email.trim();
    if email.is_empty() {
        return Err(WebError::BadRequest("Email is required".to_string()));
    }
    validate_email(email)?;

    if !state.is_authorized(email) {
        info!("Login rejected for unlisted email");
        return Err(WebError::Unauthorized(
            "Email not authorized for testing".to_string(),
        ));
    }

    let session_id = state.db().create_session(Some(email), None).await?;
    info!(session_id = %session_id, "Session opened");

    Ok(Json(LoginResponse {
        success: true,
        message: "Authentication successful".to_string(),
        session_id,
    }))
}

/// Sessions are closed through feedback, so there is nothing to tear down.
pub async fn logout() -> Json<LogoutResponse> {
    Json(LogoutResponse {
        success: true,
        message: "Logged out successfully".to_string(),
    })
}
