//! Poster, performer and studio image endpoints.
//!
//! All three fetch the origin image in full and run it through the shared
//! transcoding pipeline on the blocking pool, bounded by the context's
//! transcode semaphore. Whatever happens in the pipeline, the client gets
//! servable bytes.

use axum::extract::{Path, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::Response;
use axum::Extension;

use vg_core::MediaId;
use vg_imaging::{transcode, PassthroughReason, TranscodeInput, TranscodeOutput};

use crate::context::AppContext;
use crate::error::AppError;
use crate::headers::{insert_shared_headers, OutwardHead, DEFAULT_IMAGE_TYPE};
use crate::middleware::auth::Authorized;
use crate::middleware::request_id::RequestId;

/// Origin image a route serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSource {
    ScenePoster,
    Performer,
    Studio,
}

impl ImageSource {
    pub fn upstream_path(self, id: &MediaId) -> String {
        match self {
            ImageSource::ScenePoster => format!("/scene/{id}/screenshot"),
            ImageSource::Performer => format!("/performer/{id}/image"),
            ImageSource::Studio => format!("/studio/{id}/image"),
        }
    }
}

/// GET /media/{id}/poster
pub async fn scene_poster(
    _auth: Authorized,
    State(ctx): State<AppContext>,
    Extension(request_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    serve_image(&ctx, ImageSource::ScenePoster, &id)
        .await
        .map_err(|e| AppError::in_request(e, &request_id))
}

/// GET /actors/{id}/image
pub async fn actor_image(
    _auth: Authorized,
    State(ctx): State<AppContext>,
    Extension(request_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    serve_image(&ctx, ImageSource::Performer, &id)
        .await
        .map_err(|e| AppError::in_request(e, &request_id))
}

/// GET /studios/{id}/image
pub async fn studio_image(
    _auth: Authorized,
    State(ctx): State<AppContext>,
    Extension(request_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    serve_image(&ctx, ImageSource::Studio, &id)
        .await
        .map_err(|e| AppError::in_request(e, &request_id))
}

async fn serve_image(ctx: &AppContext, source: ImageSource, id: &str) -> vg_core::Result<Response> {
    let media_id: MediaId = id.parse()?;
    let fetched = ctx.origin.fetch_buffered(&source.upstream_path(&media_id)).await?;

    if !fetched.head.status.is_success() {
        tracing::info!(
            media_id = %media_id,
            source = ?source,
            upstream_status = fetched.head.status.as_u16(),
            "Origin rejected image request"
        );
        return Err(vg_core::Error::upstream_status(fetched.head.status.as_u16()));
    }

    let input = TranscodeInput {
        bytes: fetched.bytes,
        content_type: fetched
            .head
            .content_type
            .unwrap_or_else(|| DEFAULT_IMAGE_TYPE.to_string()),
    };
    let output = transcode_bounded(ctx, input).await;

    metrics::counter!("vrgate_transcode_total", "outcome" => output.label()).increment(1);

    Ok(image_response(output))
}

/// Run the pipeline on the blocking pool under a transcode permit.
///
/// The permit moves into the blocking task so it is held until the work
/// finishes, even if the client has already gone away.
pub async fn transcode_bounded(ctx: &AppContext, input: TranscodeInput) -> TranscodeOutput {
    let fallback = input.clone();

    let permit = match ctx.transcode_permits.clone().acquire_owned().await {
        Ok(permit) => permit,
        Err(_) => return TranscodeOutput::passthrough(fallback, PassthroughReason::Aborted, None),
    };

    let task = tokio::task::spawn_blocking(move || {
        let _permit = permit;
        transcode(input)
    });

    match task.await {
        Ok(output) => output,
        Err(e) => {
            tracing::warn!(error = %e, "Transcode task failed; serving original image");
            TranscodeOutput::passthrough(fallback, PassthroughReason::Aborted, None)
        }
    }
}

fn image_response(output: TranscodeOutput) -> Response {
    let mut headers = HeaderMap::new();
    insert_shared_headers(&mut headers);
    let content_type = HeaderValue::from_str(&output.content_type)
        .unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_IMAGE_TYPE));
    headers.insert(CONTENT_TYPE, content_type);

    OutwardHead {
        status: StatusCode::OK,
        headers,
    }
    .into_response(output.bytes.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_paths() {
        let id: MediaId = "12".parse().unwrap();
        assert_eq!(ImageSource::ScenePoster.upstream_path(&id), "/scene/12/screenshot");
        assert_eq!(ImageSource::Performer.upstream_path(&id), "/performer/12/image");
        assert_eq!(ImageSource::Studio.upstream_path(&id), "/studio/12/image");
    }

    #[tokio::test]
    async fn bounded_transcode_returns_original_on_garbage() {
        let ctx = AppContext::new(vg_core::config::Config::default(), None).unwrap();
        let input = TranscodeInput {
            bytes: bytes::Bytes::from_static(b"not an image"),
            content_type: "image/png".into(),
        };
        let out = transcode_bounded(&ctx, input).await;
        assert!(!out.is_transcoded());
        assert_eq!(out.bytes.as_ref(), b"not an image");
        assert_eq!(ctx.transcode_permits.available_permits(), 4);
    }
}
