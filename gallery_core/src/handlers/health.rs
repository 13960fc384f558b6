//! Health check handler

use crate::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use tracing::warn;

pub async fn handle_health(State(state): State<AppState>) -> impl IntoResponse {
    let timestamp = chrono::Utc::now().timestamp();

    match state.file_store.stats().await {
        Ok(stats) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "status": "healthy",
                "timestamp": timestamp,
                "version": state.version,
                "storage": stats,
            })),
        ),
        Err(e) => {
            warn!("Storage health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({
                    "status": "unhealthy",
                    "timestamp": timestamp,
                    "version": state.version,
                    "storage_error": e.to_string(),
                })),
            )
        }
    }
}
