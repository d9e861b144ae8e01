//! Health check endpoint.

use axum::extract::State;
use axum::Json;
use database::BackendKind;
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct Health {
    pub status: String,
    /// Active storage backend.
    pub backend: Option<BackendKind>,
}

/// Health check endpoint.
pub async fn health(State(state): State<AppState>) -> Json<Health> {
    Json(Health {
        status: "ok".to_string(),
        backend: state.db().backend_kind(),
    })
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};

    use crate::routes::test_support::*;

    #[tokio::test]
    async fn test_health_reports_backend() {
        let app = app(test_state().await);

        let request = Request::get("/api/health").body(Body::empty()).unwrap();
        let (status, body) = send(app, request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["backend"], "sqlite");
    }
}
