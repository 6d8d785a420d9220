//! Liveness and origin connectivity endpoints.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::context::AppContext;

/// GET /health -- process liveness, never touches the origin.
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub origin_connected: bool,
    pub timestamp: String,
}

/// GET /api/health -- runs the origin health query.
pub async fn origin_health(State(ctx): State<AppContext>) -> Json<HealthReport> {
    let origin_connected = ctx.origin.ping().await;
    if !origin_connected {
        tracing::warn!("Origin health query failed");
    }

    Json(HealthReport {
        status: if origin_connected { "healthy" } else { "unhealthy" },
        origin_connected,
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}
