use crate::server::AppState;
use axum::{extract::State, Json};
use serde_json::{json, Value};

pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "providers": state.analyzer.providers(),
        "default_provider": state.analyzer.default_provider(),
    }))
}
