//! Liveness probe for the orders service.

use axum::Json;
use serde_json::{Value, json};

/// GET /health. Reports that the process is up and serving requests.
///
/// Does not touch the database or the notification queue, so it stays
/// cheap enough for aggressive probe intervals.
pub async fn check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
