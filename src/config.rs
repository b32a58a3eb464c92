// ABOUTME: Platform configuration types and parsing for stratus.yml.
// ABOUTME: Describes the target platform endpoint, OAuth client, and deploy tunables.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

pub const CONFIG_FILENAME: &str = "stratus.yml";
pub const CONFIG_FILENAME_ALT: &str = "stratus.yaml";

/// Everything stratus needs to know about one target platform.
#[derive(Debug, Clone, Deserialize)]
pub struct PlatformConfig {
    /// Platform API endpoint, e.g. `https://api.cloud.example.com`.
    pub api_url: String,

    /// OAuth authorization endpoint.
    pub auth_url: String,

    /// OAuth token endpoint.
    pub token_url: String,

    /// OAuth client the platform issued for this deployer.
    pub client_id: String,
    pub client_secret: String,

    /// Upper bound on waiting for one backing service to become ready.
    #[serde(default = "default_service_timeout", with = "humantime_serde")]
    pub service_timeout: Duration,

    /// Deployment CLI binary to invoke. Must understand push, create-service,
    /// service and app subcommands.
    #[serde(default = "default_cli_bin")]
    pub cli_bin: String,
}

fn default_service_timeout() -> Duration {
    Duration::from_secs(600)
}

fn default_cli_bin() -> String {
    "cf".to_string()
}

impl PlatformConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(Error::from)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [dir.join(CONFIG_FILENAME), dir.join(CONFIG_FILENAME_ALT)];

        for path in &candidates {
            if path.exists() {
                return Self::load(path);
            }
        }

        Err(Error::ConfigNotFound(dir.to_path_buf()))
    }
}

/// Write a starter stratus.yml into `dir`. Refuses to overwrite unless `force`.
pub fn init_config(dir: &Path, force: bool) -> Result<()> {
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() && !force {
        return Err(Error::AlreadyExists(config_path));
    }

    std::fs::write(&config_path, template_yaml())?;

    Ok(())
}

fn template_yaml() -> &'static str {
    r#"api_url: https://api.cloud.example.com
auth_url: https://login.cloud.example.com
token_url: https://uaa.cloud.example.com
client_id: stratus
client_secret: change-me

# How long to wait for each backing service to finish provisioning.
# service_timeout: 10m

# Deployment CLI binary to invoke.
# cli_bin: cf
"#
}
