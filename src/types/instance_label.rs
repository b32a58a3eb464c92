// ABOUTME: Validated service instance label.
// ABOUTME: The label is the only handle used to create and poll a backing service.

use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InstanceLabelError {
    #[error("instance label cannot be empty")]
    Empty,

    #[error("instance label exceeds maximum length of 50 characters")]
    TooLong,

    #[error("instance label must start with a letter or digit")]
    BadLeadingChar,

    #[error("invalid character in instance label: '{0}'")]
    InvalidChar(char),
}

/// Name of a backing service instance on the target platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InstanceLabel(String);

impl InstanceLabel {
    pub fn new(value: &str) -> Result<Self, InstanceLabelError> {
        if value.is_empty() {
            return Err(InstanceLabelError::Empty);
        }

        if value.len() > 50 {
            return Err(InstanceLabelError::TooLong);
        }

        let first = value.chars().next().expect("checked non-empty");
        if !first.is_ascii_alphanumeric() {
            return Err(InstanceLabelError::BadLeadingChar);
        }

        for c in value.chars() {
            if !c.is_ascii_alphanumeric() && c != '-' && c != '_' {
                return Err(InstanceLabelError::InvalidChar(c));
            }
        }

        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InstanceLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
