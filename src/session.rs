// ABOUTME: Isolated CLI session for one deployment run.
// ABOUTME: Writes a disposable config home so concurrent runs never share CLI state.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::config::PlatformConfig;
use crate::types::Target;

/// Subdirectory of the session home the CLI reads its config from.
const CLI_CONFIG_DIR: &str = ".cf";
const CLI_CONFIG_FILE: &str = "config.json";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to write session config: {0}")]
    Write(#[from] std::io::Error),

    #[error("failed to encode session config: {0}")]
    Encode(#[from] serde_json::Error),
}

/// OAuth token material for the current operator session, supplied by the
/// identity collaborator.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub token_type: String,
    pub access_token: String,
    pub refresh_token: String,
}

impl TokenPair {
    /// Token formatted the way the CLI stores it: `<type> <access_token>`.
    pub fn bearer(&self) -> String {
        format!("{} {}", self.token_type, self.access_token)
    }
}

/// Credential/configuration scope for one deployment run. The home directory
/// lives inside the run's private working directory and is handed to every
/// CLI invocation; path uniqueness is the entire isolation mechanism.
#[derive(Debug)]
pub struct TargetSession {
    home: PathBuf,
}

impl TargetSession {
    /// Materialize the session under `home`, creating parents as needed.
    pub fn write(
        config: &PlatformConfig,
        token: &TokenPair,
        target: &Target,
        home: &Path,
    ) -> Result<Self, SessionError> {
        let doc = CliConfig {
            config_version: 3,
            target: &config.api_url,
            authorization_endpoint: &config.auth_url,
            uaa_endpoint: &config.token_url,
            oauth_client: &config.client_id,
            oauth_client_secret: &config.client_secret,
            access_token: token.bearer(),
            refresh_token: &token.refresh_token,
            organization: NamedGuid {
                guid: &target.org_guid,
                name: &target.org_name,
            },
            space: NamedGuid {
                guid: &target.space_guid,
                name: &target.space_name,
            },
        };

        let config_dir = home.join(CLI_CONFIG_DIR);
        fs::create_dir_all(&config_dir)?;
        fs::write(
            config_dir.join(CLI_CONFIG_FILE),
            serde_json::to_vec_pretty(&doc)?,
        )?;

        Ok(Self {
            home: home.to_path_buf(),
        })
    }

    /// Directory passed to the CLI as its config home.
    pub fn home(&self) -> &Path {
        &self.home
    }

    /// Where the config document lands. Test seam.
    pub fn config_path(&self) -> PathBuf {
        self.home.join(CLI_CONFIG_DIR).join(CLI_CONFIG_FILE)
    }
}

/// JSON document in the shape the deployment CLI expects.
#[derive(Serialize)]
struct CliConfig<'a> {
    #[serde(rename = "ConfigVersion")]
    config_version: u32,
    #[serde(rename = "Target")]
    target: &'a str,
    #[serde(rename = "AuthorizationEndpoint")]
    authorization_endpoint: &'a str,
    #[serde(rename = "UaaEndpoint")]
    uaa_endpoint: &'a str,
    #[serde(rename = "UAAOAuthClient")]
    oauth_client: &'a str,
    #[serde(rename = "UAAOAuthClientSecret")]
    oauth_client_secret: &'a str,
    #[serde(rename = "AccessToken")]
    access_token: String,
    #[serde(rename = "RefreshToken")]
    refresh_token: &'a str,
    #[serde(rename = "OrganizationFields")]
    organization: NamedGuid<'a>,
    #[serde(rename = "SpaceFields")]
    space: NamedGuid<'a>,
}

#[derive(Serialize)]
struct NamedGuid<'a> {
    #[serde(rename = "GUID")]
    guid: &'a str,
    #[serde(rename = "Name")]
    name: &'a str,
}
