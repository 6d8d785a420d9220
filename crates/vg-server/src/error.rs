//! Error-to-HTTP response conversion.
//!
//! Implements `IntoResponse` for [`vg_core::Error`] so that route handlers
//! can return `Result<T, AppError>` directly. Bodies only ever carry the
//! error's public message; the full error is logged.

use axum::http::header::ACCESS_CONTROL_ALLOW_ORIGIN;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::middleware::request_id::RequestId;

/// Wrapper so we can implement `IntoResponse` for an external type.
#[derive(Debug)]
pub struct AppError {
    inner: vg_core::Error,
    request_id: Option<String>,
}

impl AppError {
    pub fn new(inner: vg_core::Error) -> Self {
        Self {
            inner,
            request_id: None,
        }
    }

    pub fn with_request_id(mut self, id: String) -> Self {
        self.request_id = Some(id);
        self
    }

    /// Tag a core error with the request it occurred in.
    pub fn in_request(inner: vg_core::Error, id: &RequestId) -> Self {
        Self::new(inner).with_request_id(id.0.clone())
    }
}

impl From<vg_core::Error> for AppError {
    fn from(e: vg_core::Error) -> Self {
        Self::new(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.inner.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::error!(
                status = %status,
                error = %self.inner,
                request_id = self.request_id.as_deref().unwrap_or("-"),
                "Server error in handler"
            );
        } else {
            tracing::debug!(status = %status, error = %self.inner, "Request failed");
        }

        let code = match &self.inner {
            vg_core::Error::Unauthorized(_) => "unauthorized",
            vg_core::Error::Validation(_) => "validation_error",
            vg_core::Error::UpstreamUnavailable(_) => "upstream_unavailable",
            vg_core::Error::UpstreamNonSuccess { .. } => "not_found",
            vg_core::Error::Config(_) => "internal_error",
            vg_core::Error::Io { .. } => "internal_error",
            vg_core::Error::Internal(_) => "internal_error",
        };

        let body = json!({
            "error": self.inner.public_message(),
            "code": code,
            "request_id": self.request_id,
        });

        let mut response = (status, axum::Json(body)).into_response();
        response
            .headers_mut()
            .insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
        response
    }
}
