use axum::extract::State;
use axum::response::Json;
use serde_json::{json, Value};

use crate::state::AppState;

/// Liveness probe.
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "name": "quill-server",
        "version": env!("CARGO_PKG_VERSION"),
        "observers": state.hub.subscriber_count(),
    }))
}
