// ABOUTME: Deployment pipeline: the push/route step and the orchestrator tying all stages together.
// ABOUTME: One orchestration run serves one deployment request end-to-end.

mod orchestrator;
mod push;

pub use orchestrator::{DeployRequest, Deployed, Orchestrator};
pub use push::{AppDeployer, DeployError, ROUTE_LINE_MARKER};
