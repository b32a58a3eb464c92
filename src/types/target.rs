// ABOUTME: Deployment target: the chosen organization and space on the platform.
// ABOUTME: Parses the colon-joined form the target selection UI submits.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("expected org-guid:org-name:space-guid:space-name, got {0:?}")]
pub struct TargetParseError(pub String);

/// Organization and space a deployment lands in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub org_guid: String,
    pub org_name: String,
    pub space_guid: String,
    pub space_name: String,
}

impl FromStr for Target {
    type Err = TargetParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        match parts.as_slice() {
            [org_guid, org_name, space_guid, space_name]
                if !org_guid.is_empty() && !space_guid.is_empty() =>
            {
                Ok(Target {
                    org_guid: org_guid.to_string(),
                    org_name: org_name.to_string(),
                    space_guid: space_guid.to_string(),
                    space_name: space_name.to_string(),
                })
            }
            _ => Err(TargetParseError(s.to_string())),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}",
            self.org_guid, self.org_name, self.space_guid, self.space_name
        )
    }
}
