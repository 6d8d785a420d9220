//! Unified error type for the gateway.
//!
//! All crates funnel their failures into [`Error`], which carries enough context
//! for handlers to derive an HTTP status code via [`Error::http_status`] and a
//! client-safe message via [`Error::public_message`].

/// Unified error type covering all failure modes of the gateway.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The caller is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Request data failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The origin could not be reached (connect, DNS, timeout, broken socket).
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// The origin answered with a non-success status.
    #[error("Upstream returned status {status}")]
    UpstreamNonSuccess {
        /// Status code returned by the origin.
        status: u16,
    },

    /// Configuration could not be parsed or is unusable.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An I/O operation failed.
    #[error("IO error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Catch-all for unexpected internal errors.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Map this error to an appropriate HTTP status code.
    ///
    /// Origin non-success statuses are normalized to 404 for media paths; the
    /// asset proxy mirrors origin statuses itself and never goes through here.
    pub fn http_status(&self) -> u16 {
        match self {
            Error::Unauthorized(_) => 401,
            Error::Validation(_) => 400,
            Error::UpstreamUnavailable(_) => 500,
            Error::UpstreamNonSuccess { .. } => 404,
            Error::Config(_) => 500,
            Error::Io { .. } => 500,
            Error::Internal(_) => 500,
        }
    }

    /// Message that is safe to send to a client.
    ///
    /// Server-side failures collapse into a generic message so that origin
    /// addresses, credentials and error chains stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            Error::Validation(_) => self.to_string(),
            Error::Unauthorized(_) => "Unauthorized".to_string(),
            Error::UpstreamNonSuccess { .. } => "Not found".to_string(),
            Error::UpstreamUnavailable(_)
            | Error::Config(_)
            | Error::Io { .. }
            | Error::Internal(_) => "Internal server error".to_string(),
        }
    }

    /// Convenience constructor for [`Error::UpstreamNonSuccess`].
    pub fn upstream_status(status: u16) -> Self {
        Error::UpstreamNonSuccess { status }
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
