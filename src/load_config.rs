use crate::config::{PublishConfig, RemoteSettings};
use crate::contract::Credentials;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

pub const USERNAME_ENV: &str = "GITHUB_USERNAME";
pub const TOKEN_ENV: &str = "GITHUB_TOKEN";

#[derive(Deserialize)]
struct StaticConfig {
    country_dir: PathBuf,
    #[serde(default)]
    remote: RemoteSettings,
}

/// Loads a static YAML config file (no secrets) and merges credentials from the
/// environment. Missing credentials are not an error here; see [`require_credentials`].
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<PublishConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = fs::read_to_string(path_ref).map_err(|e| {
        error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
        anyhow::anyhow!("Failed to read config file {:?}: {}", path_ref, e)
    })?;

    let static_conf: StaticConfig = serde_yaml::from_str(&config_content).map_err(|e| {
        error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
        anyhow::anyhow!("Failed to parse config YAML: {e}")
    })?;

    if static_conf.remote.organization.trim().is_empty() {
        anyhow::bail!("remote.organization must not be empty");
    }

    let credentials = match (std::env::var(USERNAME_ENV), std::env::var(TOKEN_ENV)) {
        (Ok(username), Ok(secret)) => {
            info!(username = %username, "Remote credentials found in env");
            Some(Credentials::new(username, secret))
        }
        _ => {
            warn!("{USERNAME_ENV}/{TOKEN_ENV} not set; publishing will be unavailable");
            None
        }
    };

    let config = PublishConfig {
        country_dir: static_conf.country_dir,
        remote: static_conf.remote,
        credentials,
    };
    config.trace_loaded();
    Ok(config)
}

/// Credentials from `config`, or an error naming the missing variables.
pub fn require_credentials(config: &PublishConfig) -> Result<Credentials> {
    config
        .credentials
        .clone()
        .with_context(|| format!("{USERNAME_ENV} and {TOKEN_ENV} environment variables must be set to publish"))
}
