//! Configuration file discovery, loading and validation.

use anyhow::{Context, Result};
use std::path::Path;

pub use vg_core::config::Config;

/// Default config locations, searched in order.
const DEFAULT_PATHS: [&str; 4] = [
    "./vrgate.toml",
    "./config.toml",
    "~/.config/vrgate/config.toml",
    "/etc/vrgate/config.toml",
];

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config = Config::from_toml(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    for path_str in DEFAULT_PATHS {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            tracing::debug!("Using config file {}", path.display());
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Reject configurations the gateway cannot run with.
///
/// Softer problems are reported by [`Config::validate`] as warnings.
pub fn validate_config(config: &Config) -> Result<()> {
    if config.server.port == 0 {
        anyhow::bail!("Server port cannot be 0");
    }

    if config.server.host.trim().is_empty() {
        anyhow::bail!("Server host cannot be empty");
    }

    let url = config.origin.url.trim();
    if url.is_empty() {
        anyhow::bail!("Origin URL cannot be empty");
    }
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        anyhow::bail!("Origin URL must start with http:// or https://: {url}");
    }

    if config.origin.credential_header.trim().is_empty() {
        anyhow::bail!("Origin credential header name cannot be empty");
    }

    Ok(())
}
