//! Application context shared by all handlers via Axum state.
//!
//! Holds only immutable configuration and shared handles, so it is cheap to
//! clone and needs no locking.

use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;
use tokio::sync::Semaphore;

use vg_core::config::Config;

use crate::middleware::auth::{AuthValidator, StaticTokens};
use crate::upstream::OriginClient;

#[derive(Clone)]
pub struct AppContext {
    /// Immutable configuration snapshot.
    pub config: Arc<Config>,
    /// Credentialed origin client.
    pub origin: Arc<OriginClient>,
    /// Client token validator.
    pub auth: Arc<dyn AuthValidator>,
    /// Bounds concurrent image transcodes.
    pub transcode_permits: Arc<Semaphore>,
    /// Prometheus render handle, when a recorder is installed.
    pub metrics: Option<PrometheusHandle>,
}

impl AppContext {
    /// Build the context from configuration with the static token validator.
    pub fn new(config: Config, metrics: Option<PrometheusHandle>) -> vg_core::Result<Self> {
        let auth = Arc::new(StaticTokens::from_config(&config.auth));
        Self::with_validator(config, auth, metrics)
    }

    /// Build the context with a custom [`AuthValidator`].
    pub fn with_validator(
        config: Config,
        auth: Arc<dyn AuthValidator>,
        metrics: Option<PrometheusHandle>,
    ) -> vg_core::Result<Self> {
        let origin = Arc::new(OriginClient::new(&config.origin, &config.timeouts)?);
        let transcode_permits = Arc::new(Semaphore::new(config.images.transcode_permits()));

        Ok(Self {
            config: Arc::new(config),
            origin,
            auth,
            transcode_permits,
            metrics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_builds_context() {
        let ctx = AppContext::new(Config::default(), None).unwrap();
        assert_eq!(ctx.transcode_permits.available_permits(), 4);
        assert!(ctx.metrics.is_none());
    }

    #[test]
    fn invalid_origin_credential_fails() {
        let mut config = Config::default();
        config.origin.api_key = "line\nbreak".into();
        assert!(AppContext::new(config, None).is_err());
    }
}
