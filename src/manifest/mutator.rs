// ABOUTME: Rewrites the extracted application's own deployment manifest.
// ABOUTME: Injects env values while preserving every key it does not touch.

use std::fs;
use std::path::Path;

use serde_yaml::{Mapping, Value};

use super::ManifestError;

/// File the deployment CLI consumes, at the bundle root.
pub const APP_MANIFEST_FILENAME: &str = "manifest.yml";

/// The application's on-disk manifest, held as a generic YAML document so
/// untouched keys and nested values survive the rewrite intact.
#[derive(Debug, Clone)]
pub struct AppManifest {
    doc: Value,
}

impl AppManifest {
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(raw: &str) -> Result<Self, ManifestError> {
        let doc: Value = serde_yaml::from_str(raw)?;
        if !doc.is_mapping() {
            return Err(ManifestError::NotAMapping);
        }
        Ok(Self { doc })
    }

    /// Set one environment entry. Manifests with an `applications:` list get
    /// the entry on every application; flat manifests get it at top level.
    pub fn set_env(&mut self, name: &str, value: &str) {
        let root = self.doc.as_mapping_mut().expect("checked mapping at parse");

        match root.get_mut("applications").and_then(Value::as_sequence_mut) {
            Some(apps) => {
                for app in apps.iter_mut().filter_map(Value::as_mapping_mut) {
                    insert_env(app, name, value);
                }
            }
            None => insert_env(root, name, value),
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), ManifestError> {
        fs::write(path, self.to_yaml()?)?;
        Ok(())
    }

    pub fn to_yaml(&self) -> Result<String, ManifestError> {
        Ok(serde_yaml::to_string(&self.doc)?)
    }

    /// Look up an env entry the way `set_env` writes them. Test seam.
    pub fn env_value(&self, name: &str) -> Option<&str> {
        let root = self.doc.as_mapping()?;
        let holder = match root.get("applications").and_then(Value::as_sequence) {
            Some(apps) => apps.first()?.as_mapping()?,
            None => root,
        };
        holder.get("env")?.get(name)?.as_str()
    }
}

fn insert_env(map: &mut Mapping, name: &str, value: &str) {
    let env = map
        .entry(Value::String("env".to_string()))
        .or_insert_with(|| Value::Mapping(Mapping::new()));

    if let Some(env) = env.as_mapping_mut() {
        env.insert(
            Value::String(name.to_string()),
            Value::String(value.to_string()),
        );
    }
}
