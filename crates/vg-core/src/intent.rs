//! Request intent classification.
//!
//! Every media request is resolved to exactly one [`Intent`] before the origin
//! is contacted. The intent alone decides what happens to the client's `Range`
//! header ([`RangePolicy`]) and which response headers are synthesized.

use http::Method;

use crate::MediaId;

/// Range value sent upstream to learn a resource's size without its body.
pub const PROBE_RANGE: &str = "bytes=0-0";

/// What the client wants from a media endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intent {
    /// Headers only (HEAD). The origin is asked for a single byte.
    Probe,
    /// The whole resource as an attachment. Client ranges are ignored.
    Download,
    /// Partial content driven by the client's `Range` header.
    Stream,
}

impl Intent {
    /// Classify a request by method and presence of a `Range` header.
    ///
    /// Never fails: methods without a dedicated rule are treated as
    /// [`Intent::Stream`].
    pub fn classify(method: &Method, has_range: bool) -> Self {
        match *method {
            Method::HEAD => Intent::Probe,
            Method::GET if has_range => Intent::Stream,
            Method::GET => Intent::Download,
            _ => Intent::Stream,
        }
    }

    /// Range handling for the upstream request.
    pub fn range_policy(self) -> RangePolicy {
        match self {
            Intent::Probe => RangePolicy::ForceProbe,
            Intent::Download => RangePolicy::Strip,
            Intent::Stream => RangePolicy::Forward,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Intent::Probe => "probe",
            Intent::Download => "download",
            Intent::Stream => "stream",
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the client's `Range` header is treated when building the upstream request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangePolicy {
    /// Always send [`PROBE_RANGE`], whatever the client asked for.
    ForceProbe,
    /// Send the client's header verbatim, if present.
    Forward,
    /// Never send a `Range` header.
    Strip,
}

impl RangePolicy {
    /// Range header value to send upstream.
    pub fn upstream_range<'a>(self, client_range: Option<&'a str>) -> Option<&'a str> {
        match self {
            RangePolicy::ForceProbe => Some(PROBE_RANGE),
            RangePolicy::Forward => client_range,
            RangePolicy::Strip => None,
        }
    }
}

/// Media endpoint a request arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Stream,
    Preview,
    Download,
}

impl Endpoint {
    /// Resolve the intent for a request on this endpoint.
    ///
    /// The download endpoint always downloads; a HEAD on it still has to be
    /// answered without a body, so it becomes a probe that keeps the download
    /// headers.
    pub fn resolve_intent(self, method: &Method, has_range: bool) -> Intent {
        match self {
            Endpoint::Download if *method == Method::HEAD => Intent::Probe,
            Endpoint::Download => Intent::Download,
            Endpoint::Stream | Endpoint::Preview => Intent::classify(method, has_range),
        }
    }

    /// Path on the origin serving this endpoint's bytes.
    pub fn upstream_path(self, id: &MediaId) -> String {
        match self {
            Endpoint::Stream | Endpoint::Download => format!("/scene/{id}/stream"),
            Endpoint::Preview => format!("/scene/{id}/preview"),
        }
    }
}

/// A classified inbound media request.
#[derive(Debug, Clone)]
pub struct MediaRequest {
    pub method: Method,
    pub media_id: MediaId,
    pub endpoint: Endpoint,
    /// The client's `Range` header, untouched.
    pub range: Option<String>,
    pub intent: Intent,
}

impl MediaRequest {
    pub fn new(endpoint: Endpoint, method: Method, media_id: MediaId, range: Option<String>) -> Self {
        let intent = endpoint.resolve_intent(&method, range.is_some());
        Self {
            method,
            media_id,
            endpoint,
            range,
            intent,
        }
    }

    /// Range header value to send upstream for this request.
    pub fn upstream_range(&self) -> Option<&str> {
        self.intent.range_policy().upstream_range(self.range.as_deref())
    }

    pub fn upstream_path(&self) -> String {
        self.endpoint.upstream_path(&self.media_id)
    }

    /// Attachment filename used when the response is a download.
    pub fn download_filename(&self) -> String {
        format!("video_{}.mp4", self.media_id)
    }

    /// Whether the outward response carries an attachment disposition.
    pub fn is_attachment(&self) -> bool {
        self.intent == Intent::Download || self.endpoint == Endpoint::Download
    }
}
