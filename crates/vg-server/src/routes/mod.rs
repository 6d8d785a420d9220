//! Route handlers grouped by surface.

pub mod assets;
pub mod health;
pub mod images;
pub mod media;
pub mod metrics;

use axum::http::{Method, StatusCode, Uri};

/// Fallback for unmatched routes.
pub async fn not_found(method: Method, uri: Uri) -> (StatusCode, String) {
    tracing::debug!(%method, path = %uri.path(), "No route matched");
    (
        StatusCode::NOT_FOUND,
        format!("Endpoint not found: {method} {}", uri.path()),
    )
}
