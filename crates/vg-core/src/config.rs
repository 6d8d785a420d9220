//! Gateway configuration types.
//!
//! The top-level [`Config`] struct is deserialized from TOML and carries the
//! listener, origin, timeout, image and auth sections. Every section defaults
//! sensibly so a completely empty file is valid.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::Result;
use crate::Error;

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root gateway configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub origin: OriginConfig,
    pub timeouts: TimeoutConfig,
    pub images: ImageConfig,
    pub auth: AuthConfig,
}

impl Config {
    /// Deserialize a `Config` from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str).map_err(|e| Error::Config(format!("config parse error: {e}")))
    }

    /// Return a list of non-fatal warnings about the configuration.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.origin.api_key.is_empty() {
            warnings.push("origin.api_key is empty; origin requests are sent without a credential".into());
        }

        if self.timeouts.probe_secs == 0 {
            warnings.push("timeouts.probe_secs is 0; probe fetches will time out immediately".into());
        }

        if self.images.max_concurrent_transcodes == 0 {
            warnings.push("images.max_concurrent_transcodes is 0; treating it as 1".into());
        }

        if self.auth.enabled && self.auth.api_key.is_none() && self.auth.tokens.is_empty() {
            warnings.push("auth is enabled but neither api_key nor tokens are set; every gated request will be rejected".into());
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

/// HTTP listener configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8890,
        }
    }
}

// ---------------------------------------------------------------------------
// Origin
// ---------------------------------------------------------------------------

/// Upstream media origin the gateway fetches from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OriginConfig {
    /// Base URL of the origin, e.g. `http://localhost:9999`.
    pub url: String,
    /// Credential value attached to every origin request.
    pub api_key: String,
    /// Name of the header that carries [`OriginConfig::api_key`].
    pub credential_header: String,
    /// GraphQL endpoint used for health checks; defaults to `<url>/graphql`.
    pub graphql_url: Option<String>,
}

impl Default for OriginConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:9999".into(),
            api_key: String::new(),
            credential_header: "ApiKey".into(),
            graphql_url: None,
        }
    }
}

impl OriginConfig {
    /// Origin base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.url.trim_end_matches('/')
    }

    /// Resolved GraphQL endpoint.
    pub fn graphql_endpoint(&self) -> String {
        match self.graphql_url.as_deref() {
            Some(url) if !url.is_empty() => url.to_string(),
            _ => format!("{}/graphql", self.base_url()),
        }
    }
}

// ---------------------------------------------------------------------------
// Timeouts
// ---------------------------------------------------------------------------

/// Origin timeouts.
///
/// Probes and buffered image fetches use the short `probe_secs` budget; full
/// stream and download transfers use `transfer_secs`, where 0 means unbounded.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    pub connect_secs: u64,
    pub probe_secs: u64,
    pub transfer_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 10,
            probe_secs: 15,
            transfer_secs: 0,
        }
    }
}

impl TimeoutConfig {
    pub fn connect(&self) -> Duration {
        Duration::from_secs(self.connect_secs)
    }

    pub fn probe(&self) -> Duration {
        Duration::from_secs(self.probe_secs)
    }

    /// Total budget for a stream or download transfer, if any.
    pub fn transfer(&self) -> Option<Duration> {
        (self.transfer_secs > 0).then(|| Duration::from_secs(self.transfer_secs))
    }
}

// ---------------------------------------------------------------------------
// Images
// ---------------------------------------------------------------------------

/// Image transcoding settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    /// Upper bound on transcodes running at the same time.
    pub max_concurrent_transcodes: usize,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            max_concurrent_transcodes: 4,
        }
    }
}

impl ImageConfig {
    /// Semaphore size, never zero.
    pub fn transcode_permits(&self) -> usize {
        self.max_concurrent_transcodes.max(1)
    }
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

/// Client authentication settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub enabled: bool,
    /// Primary accepted token.
    pub api_key: Option<String>,
    /// Additional accepted tokens.
    pub tokens: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_is_default() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8890);
        assert_eq!(config.origin.credential_header, "ApiKey");
        assert_eq!(config.timeouts.transfer(), None);
        assert!(!config.auth.enabled);
    }

    #[test]
    fn parses_partial_sections() {
        let config = Config::from_toml(
            r#"
            [origin]
            url = "http://stash.local:9999/"
            api_key = "secret"

            [timeouts]
            probe_secs = 3
            transfer_secs = 600
            "#,
        )
        .unwrap();

        assert_eq!(config.origin.base_url(), "http://stash.local:9999");
        assert_eq!(config.origin.graphql_endpoint(), "http://stash.local:9999/graphql");
        assert_eq!(config.timeouts.probe(), Duration::from_secs(3));
        assert_eq!(config.timeouts.transfer(), Some(Duration::from_secs(600)));
        assert_eq!(config.timeouts.connect(), Duration::from_secs(10));
    }

    #[test]
    fn explicit_graphql_url_wins() {
        let origin = OriginConfig {
            graphql_url: Some("http://gql.local/graphql".into()),
            ..OriginConfig::default()
        };
        assert_eq!(origin.graphql_endpoint(), "http://gql.local/graphql");
    }

    #[test]
    fn invalid_toml_is_config_error() {
        let err = Config::from_toml("[server]\nport = \"nope\"").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn validate_warns_on_missing_credentials() {
        let mut config = Config::default();
        config.auth.enabled = true;
        config.images.max_concurrent_transcodes = 0;

        let warnings = config.validate();
        assert!(warnings.iter().any(|w| w.contains("origin.api_key")));
        assert!(warnings.iter().any(|w| w.contains("auth is enabled")));
        assert!(warnings.iter().any(|w| w.contains("max_concurrent_transcodes")));
        assert_eq!(config.images.transcode_permits(), 1);
    }

    #[test]
    fn validate_clean_config() {
        let mut config = Config::default();
        config.origin.api_key = "k".into();
        assert!(config.validate().is_empty());
    }
}
