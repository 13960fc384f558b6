//! Route table for the upload service

use crate::AppState;
use axum::{
    extract::State,
    response::IntoResponse,
    routing::{delete, get, post, put},
    Json, Router,
};

use super::{files, health};

pub fn create_routes(public_prefix: &str) -> Router<AppState> {
    let public_prefix = public_prefix.trim_end_matches('/');

    Router::new()
        .route("/", get(handle_root))
        .route("/health", get(health::handle_health))
        .route("/files", get(files::list_files))
        .route("/upload", post(files::upload_file))
        .route("/delete/:filename", delete(files::delete_file))
        .route("/update/:filename", put(files::update_file))
        .route(&format!("{}/:filename", public_prefix), get(files::serve_file))
}

async fn handle_root(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "app": state.app_name,
        "version": state.version,
        "endpoints": {
            "health": "GET /health",
            "list": "GET /files",
            "upload": "POST /upload",
            "delete": "DELETE /delete/{filename}",
            "update": "PUT /update/{filename}",
            "content": format!("GET {}/{{filename}}", state.public_prefix),
        }
    }))
}
