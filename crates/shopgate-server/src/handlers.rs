//! Service-level handlers: root banner and health probe.

use axum::Json;
use serde_json::{Value, json};

/// `GET /` — service banner.
pub async fn root() -> Json<Value> {
    Json(json!({
        "service": "Shopgate Gateway",
        "status": "ok",
    }))
}

/// `GET /healthz` — liveness probe.
pub async fn healthz() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
