//! Origin HTTP client.
//!
//! Every request carries the configured credential header. Media requests
//! apply the intent's range policy and are returned with the body unread so
//! it can be relayed incrementally; image requests are buffered in full.

use std::time::Duration;

use bytes::Bytes;
use futures::{Stream, TryStreamExt};
use reqwest::header::{HeaderName, HeaderValue, CONTENT_LENGTH, CONTENT_RANGE, CONTENT_TYPE, RANGE};
use reqwest::StatusCode;
use serde_json::json;

use vg_core::config::{OriginConfig, TimeoutConfig};
use vg_core::{Error, Intent, MediaRequest};

/// GraphQL query used to check that the origin is reachable and authorized.
const HEALTH_QUERY: &str = "query { findScenes { count } }";

/// Status line and entity headers of an origin response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamHead {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub content_length: Option<u64>,
    pub content_range: Option<String>,
}

impl UpstreamHead {
    fn from_response(response: &reqwest::Response) -> Self {
        let headers = response.headers();
        let text = |name: HeaderName| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(String::from)
        };

        Self {
            status: response.status(),
            content_type: text(CONTENT_TYPE),
            content_length: text(CONTENT_LENGTH).and_then(|v| v.trim().parse().ok()),
            content_range: text(CONTENT_RANGE),
        }
    }
}

/// An origin response whose body has not been read yet.
pub struct UpstreamResponse {
    pub head: UpstreamHead,
    response: reqwest::Response,
}

impl UpstreamResponse {
    /// Consume the response as a stream of body chunks.
    ///
    /// Errors are stripped of the request URL before they can reach a log line.
    pub fn into_body_stream(self) -> impl Stream<Item = Result<Bytes, reqwest::Error>> + Send + 'static {
        self.response.bytes_stream().map_err(reqwest::Error::without_url)
    }
}

/// An origin response read to completion.
#[derive(Debug, Clone)]
pub struct BufferedResponse {
    pub head: UpstreamHead,
    pub bytes: Bytes,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct OriginClient {
    http: reqwest::Client,
    base_url: String,
    graphql_url: String,
    credential: Option<(HeaderName, HeaderValue)>,
    probe_timeout: Duration,
    transfer_timeout: Option<Duration>,
}

impl OriginClient {
    pub fn new(origin: &OriginConfig, timeouts: &TimeoutConfig) -> vg_core::Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(timeouts.connect())
            .build()
            .map_err(|e| Error::Config(format!("failed to build origin client: {e}")))?;

        let credential = if origin.api_key.is_empty() {
            None
        } else {
            let name = HeaderName::from_bytes(origin.credential_header.as_bytes()).map_err(|e| {
                Error::Config(format!(
                    "invalid origin.credential_header {:?}: {e}",
                    origin.credential_header
                ))
            })?;
            let mut value = HeaderValue::from_str(&origin.api_key)
                .map_err(|_| Error::Config("origin.api_key is not a valid header value".into()))?;
            value.set_sensitive(true);
            Some((name, value))
        };

        Ok(Self {
            http,
            base_url: origin.base_url().to_string(),
            graphql_url: origin.graphql_endpoint(),
            credential,
            probe_timeout: timeouts.probe(),
            transfer_timeout: timeouts.transfer(),
        })
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        let request = self.http.get(self.url_for(path));
        match &self.credential {
            Some((name, value)) => request.header(name.clone(), value.clone()),
            None => request,
        }
    }

    /// Fetch the bytes behind a classified media request.
    ///
    /// Probes always ask for `bytes=0-0` under the short timeout. Streams
    /// forward the client range, downloads never send one; both run under the
    /// transfer timeout, which may be unbounded.
    pub async fn fetch_media(&self, request: &MediaRequest) -> vg_core::Result<UpstreamResponse> {
        let mut builder = self.get(&request.upstream_path());
        if let Some(range) = request.upstream_range() {
            builder = builder.header(RANGE, range);
        }

        let timeout = match request.intent {
            Intent::Probe => Some(self.probe_timeout),
            Intent::Stream | Intent::Download => self.transfer_timeout,
        };
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await.map_err(transport_error)?;
        let head = UpstreamHead::from_response(&response);
        record_request(request.intent.as_str(), head.status);

        tracing::debug!(
            media_id = %request.media_id,
            intent = %request.intent,
            upstream_status = head.status.as_u16(),
            content_range = head.content_range.as_deref().unwrap_or("-"),
            "Origin responded"
        );

        Ok(UpstreamResponse { head, response })
    }

    /// Fetch a small resource (poster, portrait, logo) and read it fully.
    pub async fn fetch_buffered(&self, path: &str) -> vg_core::Result<BufferedResponse> {
        let response = self
            .get(path)
            .timeout(self.probe_timeout)
            .send()
            .await
            .map_err(transport_error)?;
        let head = UpstreamHead::from_response(&response);
        record_request("image", head.status);

        let bytes = if head.status.is_success() {
            response.bytes().await.map_err(transport_error)?
        } else {
            Bytes::new()
        };

        Ok(BufferedResponse { head, bytes })
    }

    /// Fetch an arbitrary origin path for the asset proxy, body unread.
    pub async fn fetch_asset(&self, path_and_query: &str) -> vg_core::Result<UpstreamResponse> {
        let mut builder = self.get(path_and_query);
        if let Some(timeout) = self.transfer_timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await.map_err(transport_error)?;
        let head = UpstreamHead::from_response(&response);
        record_request("asset", head.status);

        Ok(UpstreamResponse { head, response })
    }

    /// Run the health query against the origin's GraphQL endpoint.
    pub async fn ping(&self) -> bool {
        let mut builder = self
            .http
            .post(&self.graphql_url)
            .timeout(self.probe_timeout)
            .json(&json!({ "query": HEALTH_QUERY }));
        if let Some((name, value)) = &self.credential {
            builder = builder.header(name.clone(), value.clone());
        }

        match builder.send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::debug!(error = %e.without_url(), "Origin health query failed");
                false
            }
        }
    }
}

/// Map a transport failure to [`Error::UpstreamUnavailable`], dropping the URL.
fn transport_error(e: reqwest::Error) -> Error {
    let e = e.without_url();
    let mut message = e.to_string();
    let mut source = std::error::Error::source(&e);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    Error::UpstreamUnavailable(message)
}

fn record_request(kind: &'static str, status: StatusCode) {
    metrics::counter!(
        "vrgate_upstream_requests_total",
        "kind" => kind,
        "status" => status.as_u16().to_string()
    )
    .increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_credential_header() {
        let origin = OriginConfig {
            api_key: "k".into(),
            credential_header: "Api Key".into(),
            ..OriginConfig::default()
        };
        let err = OriginClient::new(&origin, &TimeoutConfig::default()).err().unwrap();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn empty_api_key_sends_no_credential() {
        let client = OriginClient::new(&OriginConfig::default(), &TimeoutConfig::default()).unwrap();
        assert!(client.credential.is_none());
        assert_eq!(client.url_for("/scene/1/stream"), "http://localhost:9999/scene/1/stream");
    }

    #[test]
    fn credential_is_marked_sensitive() {
        let origin = OriginConfig {
            api_key: "secret".into(),
            ..OriginConfig::default()
        };
        let client = OriginClient::new(&origin, &TimeoutConfig::default()).unwrap();
        let (name, value) = client.credential.unwrap();
        assert_eq!(name.as_str(), "apikey");
        assert!(value.is_sensitive());
    }
}
