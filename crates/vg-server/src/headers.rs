//! Range/header translation from origin responses to client responses.
//!
//! [`translate`] is a pure function of the classified request and the origin's
//! status line and entity headers. It never recomputes range arithmetic: a
//! `Content-Range` received with a 206 is reproduced byte-for-byte.

use axum::body::Body;
use axum::http::header::{
    ACCEPT_RANGES, ACCESS_CONTROL_ALLOW_ORIGIN, CACHE_CONTROL, CONTENT_DISPOSITION, CONTENT_LENGTH,
    CONTENT_RANGE, CONTENT_TYPE,
};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::Response;

use vg_core::{Intent, MediaRequest};

use crate::upstream::UpstreamHead;

/// `Cache-Control` value on every media and image response.
pub const CACHE_CONTROL_VALUE: &str = "public, max-age=3600";

/// Content type assumed when the origin sends none for media.
pub const DEFAULT_VIDEO_TYPE: &str = "video/mp4";

/// Content type assumed when the origin sends none for images and assets.
pub const DEFAULT_IMAGE_TYPE: &str = "image/jpeg";

/// Status and headers of the outward response.
#[derive(Debug, Clone)]
pub struct OutwardHead {
    pub status: StatusCode,
    pub headers: HeaderMap,
}

impl OutwardHead {
    /// Attach a body and build the response.
    pub fn into_response(self, body: Body) -> Response {
        let mut response = Response::new(body);
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

/// Insert the caching and CORS headers shared by every proxied response.
pub fn insert_shared_headers(headers: &mut HeaderMap) {
    headers.insert(CACHE_CONTROL, HeaderValue::from_static(CACHE_CONTROL_VALUE));
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
}

/// Translate the origin's head into the client-facing head for `request`.
pub fn translate(request: &MediaRequest, upstream: &UpstreamHead) -> OutwardHead {
    let mut headers = HeaderMap::new();
    insert_shared_headers(&mut headers);
    insert_text(
        &mut headers,
        CONTENT_TYPE,
        upstream.content_type.as_deref().unwrap_or(DEFAULT_VIDEO_TYPE),
    );

    let status = match request.intent {
        Intent::Probe => {
            headers.insert(ACCEPT_RANGES, HeaderValue::from_static("bytes"));
            if let Some(total) = probe_length(upstream) {
                headers.insert(CONTENT_LENGTH, HeaderValue::from(total));
            }
            StatusCode::OK
        }
        Intent::Stream => {
            headers.insert(ACCEPT_RANGES, HeaderValue::from_static("bytes"));
            if let Some(len) = upstream.content_length {
                headers.insert(CONTENT_LENGTH, HeaderValue::from(len));
            }
            if upstream.status == StatusCode::PARTIAL_CONTENT {
                if let Some(range) = upstream.content_range.as_deref() {
                    insert_text(&mut headers, CONTENT_RANGE, range);
                }
                StatusCode::PARTIAL_CONTENT
            } else {
                StatusCode::OK
            }
        }
        Intent::Download => {
            // A partial body under a 200 must not advertise a length.
            if upstream.status != StatusCode::PARTIAL_CONTENT {
                if let Some(len) = upstream.content_length {
                    headers.insert(CONTENT_LENGTH, HeaderValue::from(len));
                }
            }
            StatusCode::OK
        }
    };

    if request.is_attachment() {
        let disposition = format!("attachment; filename={}", request.download_filename());
        insert_text(&mut headers, CONTENT_DISPOSITION, &disposition);
    }

    OutwardHead { status, headers }
}

/// Full resource size learned from a `bytes=0-0` probe.
///
/// Prefers the total in `Content-Range: bytes 0-0/<total>`. Falls back to the
/// origin's `Content-Length` when the range was ignored or the total is `*`.
pub fn probe_length(upstream: &UpstreamHead) -> Option<u64> {
    upstream
        .content_range
        .as_deref()
        .and_then(content_range_total)
        .or(upstream.content_length)
}

/// Parse the complete length from a `Content-Range` value.
pub fn content_range_total(value: &str) -> Option<u64> {
    let (_, total) = value.rsplit_once('/')?;
    total.trim().parse().ok()
}

fn insert_text(headers: &mut HeaderMap, name: axum::http::HeaderName, value: &str) {
    if let Ok(v) = HeaderValue::from_str(value) {
        headers.insert(name, v);
    }
}
