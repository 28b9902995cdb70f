use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info};

use crate::contract::Credentials;

pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_ORGANIZATION: &str = "openelections";
pub const DEFAULT_PUBLISH_BRANCH: &str = "master";
pub const DEFAULT_PUBLIC_BRANCH: &str = "gh-pages";

/// Fully merged configuration: static file plus secrets from the environment.
#[derive(Debug)]
pub struct PublishConfig {
    /// Country root; result files live in `<country_dir>/bakery`.
    pub country_dir: PathBuf,
    pub remote: RemoteSettings,
    /// Absent when the environment carries no credentials (listing only).
    pub credentials: Option<Credentials>,
}

impl PublishConfig {
    pub fn trace_loaded(&self) {
        info!(
            country_dir = %self.country_dir.display(),
            organization = %self.remote.organization,
            credentials = self.credentials.is_some(),
            "Loaded PublishConfig"
        );
        debug!(?self, "PublishConfig loaded (full debug)");
    }
}

/// Where and how results are published.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteSettings {
    pub api_url: String,
    /// Owner of the results repositories and prefix of their names.
    pub organization: String,
    /// Branch files are committed to.
    pub publish_branch: String,
    /// Branch the publish branch is merged into to make files public.
    pub public_branch: String,
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            organization: DEFAULT_ORGANIZATION.to_string(),
            publish_branch: DEFAULT_PUBLISH_BRANCH.to_string(),
            public_branch: DEFAULT_PUBLIC_BRANCH.to_string(),
        }
    }
}
