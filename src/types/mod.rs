// ABOUTME: Validated domain types shared across the crate.
// ABOUTME: Newtypes catch malformed names before they reach the deployment CLI.

mod app_name;
mod instance_label;
mod target;

pub use app_name::AppName;
pub use instance_label::{InstanceLabel, InstanceLabelError};
pub use target::{Target, TargetParseError};
