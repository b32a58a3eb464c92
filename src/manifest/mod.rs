// ABOUTME: Deployment descriptor types and loading.
// ABOUTME: Parses the repository's manifest.yml deployment section with serde_yaml.

mod mutator;

pub use mutator::{APP_MANIFEST_FILENAME, AppManifest};

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Deserialize;
use thiserror::Error;

use crate::repo::{RepoContent, RepoError, Source};
use crate::types::InstanceLabel;

/// File the descriptor is read from, at the repository root.
pub const DESCRIPTOR_FILENAME: &str = "manifest.yml";

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to fetch deployment manifest: {0}")]
    Fetch(#[from] RepoError),

    #[error("malformed manifest: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("duplicate service instance label: {0}")]
    DuplicateLabel(InstanceLabel),

    #[error("manifest is not a YAML mapping")]
    NotAMapping,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// One environment variable the application expects the operator to supply.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EnvVarSpec {
    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub required: bool,

    /// Empty until the operator supplies one.
    #[serde(default)]
    pub value: String,
}

/// One backing service the application depends on.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceSpec {
    /// Marketplace offering to instantiate.
    #[serde(rename = "service")]
    pub offering: String,

    pub plan: String,

    /// Instance name, the handle used to create and poll the service.
    #[serde(deserialize_with = "deserialize_label")]
    pub label: InstanceLabel,

    #[serde(default)]
    pub tags: Vec<String>,

    /// Offering-specific creation parameters, passed through as JSON.
    #[serde(default)]
    pub config: BTreeMap<String, serde_yaml::Value>,
}

/// The environment contract and service dependency list of one application.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Descriptor {
    #[serde(default)]
    pub env: BTreeMap<String, EnvVarSpec>,

    #[serde(default)]
    pub services: Vec<ServiceSpec>,
}

#[derive(Debug, Deserialize)]
struct DescriptorFile {
    deployment: Descriptor,
}

impl Descriptor {
    /// Parse the descriptor out of a manifest.yml document. Instance labels
    /// must be unique: they are the only handle used to poll provisioning.
    pub fn parse(raw: &[u8]) -> Result<Self, ManifestError> {
        let file: DescriptorFile = serde_yaml::from_slice(raw)?;
        let descriptor = file.deployment;

        let mut seen = HashSet::new();
        for service in &descriptor.services {
            if !seen.insert(&service.label) {
                return Err(ManifestError::DuplicateLabel(service.label.clone()));
            }
        }

        Ok(descriptor)
    }

    /// Copy operator-supplied values into matching env entries. Names the
    /// descriptor does not declare are ignored.
    pub fn apply_values(&mut self, values: &HashMap<String, String>) {
        for (name, var) in &mut self.env {
            if let Some(value) = values.get(name) {
                var.value = value.clone();
            }
        }
    }

    /// Names of required variables still missing a value.
    pub fn missing_required(&self) -> Vec<String> {
        self.env
            .iter()
            .filter(|(_, var)| var.required && var.value.is_empty())
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Env entries that actually carry a value, ready for injection.
    pub fn supplied_env(&self) -> impl Iterator<Item = (&str, &str)> {
        self.env
            .iter()
            .filter(|(_, var)| !var.value.is_empty())
            .map(|(name, var)| (name.as_str(), var.value.as_str()))
    }
}

/// Fetch and parse the descriptor for `source`.
pub async fn load(repo: &dyn RepoContent, source: &Source) -> Result<Descriptor, ManifestError> {
    let raw = repo.fetch_file(source, DESCRIPTOR_FILENAME).await?;
    Descriptor::parse(&raw)
}

fn deserialize_label<'de, D>(deserializer: D) -> Result<InstanceLabel, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    InstanceLabel::new(&s).map_err(serde::de::Error::custom)
}
