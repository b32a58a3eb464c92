// ABOUTME: App push and route discovery against the isolated session.
// ABOUTME: Push failure and route-discovery failure are distinct outcomes.

use std::path::Path;

use thiserror::Error;

use crate::runner::CommandRunner;
use crate::types::AppName;

/// Prefix of the app-status line carrying the assigned routes.
pub const ROUTE_LINE_MARKER: &str = "urls: ";

#[derive(Debug, Error)]
pub enum DeployError {
    #[error("push failed for {app}: {reason}")]
    PushFailed { app: AppName, reason: String },

    #[error("status query failed for {app}: {reason}")]
    StatusQueryFailed { app: AppName, reason: String },

    /// The push reported success but the status output never named a route.
    #[error("no route found for {app}")]
    RouteNotFound { app: AppName },
}

/// Pushes the application bundle and recovers its public route.
pub struct AppDeployer<'a, R: ?Sized> {
    runner: &'a R,
    home: &'a Path,
}

impl<'a, R: CommandRunner + ?Sized> AppDeployer<'a, R> {
    pub fn new(runner: &'a R, home: &'a Path) -> Self {
        Self { runner, home }
    }

    /// Push `app` using the mutated manifest and the extracted bundle root.
    pub async fn push(
        &self,
        app: &AppName,
        manifest: &Path,
        bundle: &Path,
    ) -> Result<(), DeployError> {
        let args = vec![
            "push".to_string(),
            app.to_string(),
            "-f".to_string(),
            manifest.display().to_string(),
            "-p".to_string(),
            bundle.display().to_string(),
        ];

        let output = self
            .runner
            .run(self.home, &args)
            .await
            .map_err(|e| DeployError::PushFailed {
                app: app.clone(),
                reason: e.to_string(),
            })?;

        if !output.success {
            return Err(DeployError::PushFailed {
                app: app.clone(),
                reason: exit_reason(output.exit_code),
            });
        }

        Ok(())
    }

    /// Query the deployed app's status and scan for the route line.
    pub async fn discover_route(&self, app: &AppName) -> Result<String, DeployError> {
        let args = vec!["app".to_string(), app.to_string()];

        let output = self.runner.run(self.home, &args).await.map_err(|e| {
            DeployError::StatusQueryFailed {
                app: app.clone(),
                reason: e.to_string(),
            }
        })?;

        if !output.success {
            return Err(DeployError::StatusQueryFailed {
                app: app.clone(),
                reason: exit_reason(output.exit_code),
            });
        }

        output
            .lines()
            .find_map(|line| line.strip_prefix(ROUTE_LINE_MARKER))
            .map(str::to_string)
            .ok_or_else(|| DeployError::RouteNotFound { app: app.clone() })
    }
}

fn exit_reason(exit_code: Option<i32>) -> String {
    match exit_code {
        Some(code) => format!("CLI exited with status {code}"),
        None => "CLI terminated by signal".to_string(),
    }
}
