//! Sprite and static asset proxy.
//!
//! Forwards `/assets/<path>` to `<origin>/<path>` with the credential attached.
//! Unlike the media routes, the origin's status code is passed through as-is.

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::{HeaderMap, HeaderValue, Uri};
use axum::response::Response;
use axum::Extension;

use crate::context::AppContext;
use crate::error::AppError;
use crate::headers::{insert_shared_headers, OutwardHead, DEFAULT_IMAGE_TYPE};
use crate::middleware::request_id::RequestId;
use crate::relay::relay;

/// Route prefix stripped before forwarding.
pub const ASSETS_PREFIX: &str = "/assets";

/// GET /assets/{*path}
pub async fn proxy_asset(
    State(ctx): State<AppContext>,
    Extension(request_id): Extension<RequestId>,
    Path(decoded): Path<String>,
    uri: Uri,
) -> Result<Response, AppError> {
    let upstream_path = asset_upstream_path(&decoded, &uri)
        .map_err(|e| AppError::in_request(e, &request_id))?;

    let upstream = ctx
        .origin
        .fetch_asset(&upstream_path)
        .await
        .map_err(|e| AppError::in_request(e, &request_id))?;
    let status = upstream.head.status;

    let mut headers = HeaderMap::new();
    insert_shared_headers(&mut headers);

    if !status.is_success() {
        tracing::debug!(upstream_status = status.as_u16(), "Mirroring origin asset status");
        return Ok(OutwardHead { status, headers }.into_response(Body::empty()));
    }

    let content_type = upstream
        .head
        .content_type
        .as_deref()
        .and_then(|v| HeaderValue::from_str(v).ok())
        .unwrap_or_else(|| HeaderValue::from_static(DEFAULT_IMAGE_TYPE));
    headers.insert(CONTENT_TYPE, content_type);
    if let Some(len) = upstream.head.content_length {
        headers.insert(CONTENT_LENGTH, HeaderValue::from(len));
    }

    let body = relay(upstream.into_body_stream(), "asset");
    Ok(OutwardHead { status, headers }.into_response(body))
}

/// Origin path (with query) for an asset request.
///
/// The raw, still-encoded path is forwarded; the decoded form is only used to
/// refuse `..` segments.
pub fn asset_upstream_path(decoded: &str, uri: &Uri) -> vg_core::Result<String> {
    if decoded.split('/').any(|segment| segment == "..") {
        return Err(vg_core::Error::Validation("asset path must not contain '..'".into()));
    }

    let raw = uri.path().strip_prefix(ASSETS_PREFIX).unwrap_or(uri.path());
    Ok(match uri.query() {
        Some(query) => format!("{raw}?{query}"),
        None => raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_encoding_and_query() {
        let uri: Uri = "/assets/scene/5/vtt/sprite%20sheet.jpg?t=1".parse().unwrap();
        let path = asset_upstream_path("scene/5/vtt/sprite sheet.jpg", &uri).unwrap();
        assert_eq!(path, "/scene/5/vtt/sprite%20sheet.jpg?t=1");
    }

    #[test]
    fn rejects_parent_segments() {
        let uri: Uri = "/assets/a/%2e%2e/secret".parse().unwrap();
        let err = asset_upstream_path("a/../secret", &uri).unwrap_err();
        assert_eq!(err.http_status(), 400);
    }

    #[test]
    fn dots_inside_names_are_fine() {
        let uri: Uri = "/assets/scene/1/sprite..jpg".parse().unwrap();
        assert!(asset_upstream_path("scene/1/sprite..jpg", &uri).is_ok());
    }
}
