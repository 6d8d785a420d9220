//! Stream, preview and download endpoints.
//!
//! Each handler classifies the request into a [`MediaRequest`], fetches from
//! the origin with the intent's range policy, translates the head, and relays
//! the body. Probes answer with headers only.

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::header::RANGE;
use axum::http::{HeaderMap, Method};
use axum::response::Response;
use axum::Extension;

use vg_core::{Endpoint, Intent, MediaId, MediaRequest};

use crate::context::AppContext;
use crate::error::AppError;
use crate::headers::translate;
use crate::middleware::auth::Authorized;
use crate::middleware::request_id::RequestId;
use crate::relay::relay;

/// ANY /media/{id}/stream
pub async fn stream_media(
    State(ctx): State<AppContext>,
    Extension(request_id): Extension<RequestId>,
    Path(id): Path<String>,
    method: Method,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    serve(&ctx, Endpoint::Stream, method, &id, &headers)
        .await
        .map_err(|e| AppError::in_request(e, &request_id))
}

/// ANY /media/{id}/preview
pub async fn preview_media(
    _auth: Authorized,
    State(ctx): State<AppContext>,
    Extension(request_id): Extension<RequestId>,
    Path(id): Path<String>,
    method: Method,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    serve(&ctx, Endpoint::Preview, method, &id, &headers)
        .await
        .map_err(|e| AppError::in_request(e, &request_id))
}

/// GET|HEAD|POST|PUT /media/{id}/download
pub async fn download_media(
    _auth: Authorized,
    State(ctx): State<AppContext>,
    Extension(request_id): Extension<RequestId>,
    Path(id): Path<String>,
    method: Method,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    serve(&ctx, Endpoint::Download, method, &id, &headers)
        .await
        .map_err(|e| AppError::in_request(e, &request_id))
}

/// Build the classified request from the raw parts.
pub fn media_request(
    endpoint: Endpoint,
    method: Method,
    id: &str,
    headers: &HeaderMap,
) -> vg_core::Result<MediaRequest> {
    let media_id: MediaId = id.parse()?;
    let range = headers
        .get(RANGE)
        .and_then(|v| v.to_str().ok())
        .map(String::from);
    Ok(MediaRequest::new(endpoint, method, media_id, range))
}

async fn serve(
    ctx: &AppContext,
    endpoint: Endpoint,
    method: Method,
    id: &str,
    headers: &HeaderMap,
) -> vg_core::Result<Response> {
    let request = media_request(endpoint, method, id, headers)?;
    let upstream = ctx.origin.fetch_media(&request).await?;

    if !upstream.head.status.is_success() {
        tracing::info!(
            media_id = %request.media_id,
            intent = %request.intent,
            upstream_status = upstream.head.status.as_u16(),
            "Origin rejected media request"
        );
        return Err(vg_core::Error::upstream_status(upstream.head.status.as_u16()));
    }

    let outward = translate(&request, &upstream.head);

    if request.intent == Intent::Probe {
        return Ok(outward.into_response(Body::empty()));
    }

    tracing::debug!(
        media_id = %request.media_id,
        intent = %request.intent,
        status = outward.status.as_u16(),
        "Relaying media body"
    );
    let body = relay(upstream.into_body_stream(), request.intent.as_str());
    Ok(outward.into_response(body))
}
