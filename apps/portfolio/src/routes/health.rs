use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Returns a simple status object with service version and content counts.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    let data = state.data.current();
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "portfolio",
        "content": {
            "posts": data.posts.len(),
            "projects": data.projects.len(),
        }
    }))
}
