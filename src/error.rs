// ABOUTME: Application-wide error types for stratus.
// ABOUTME: Uses thiserror for ergonomic error handling.

use std::path::PathBuf;
use thiserror::Error;

use crate::archive::ArchiveError;
use crate::catalog::CatalogError;
use crate::deploy::DeployError;
use crate::manifest::ManifestError;
use crate::provision::ProvisionError;
use crate::session::SessionError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("file already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error("configuration file not found in {0}")]
    ConfigNotFound(PathBuf),

    #[error("missing required environment values: {}", .0.join(", "))]
    MissingValues(Vec<String>),

    #[error("invalid target (expected org-guid:org-name:space-guid:space-name): {0}")]
    InvalidTarget(String),

    #[error("invalid environment value (expected NAME=VALUE): {0}")]
    InvalidEnvPair(String),

    #[error("no session token available (set STRATUS_ACCESS_TOKEN)")]
    Unauthenticated,

    #[error(transparent)]
    Archive(#[from] ArchiveError),

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Provision(#[from] ProvisionError),

    #[error(transparent)]
    Deploy(#[from] DeployError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
