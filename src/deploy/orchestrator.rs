// ABOUTME: The deployment orchestrator: manifest, archive, mutation, session, services, push.
// ABOUTME: Each stage gates the next; every resource lives in one run's private tempdir.

use std::collections::HashMap;
use std::fs;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::archive::{self, ArchiveError};
use crate::config::PlatformConfig;
use crate::diagnostics::{Diagnostics, Warning};
use crate::error::{Error, Result};
use crate::manifest::{self, AppManifest};
use crate::output::Output;
use crate::provision::{LineMatchProbe, Provisioner};
use crate::repo::{RepoContent, Source};
use crate::runner::CommandRunner;
use crate::session::{TargetSession, TokenPair};
use crate::types::{AppName, Target};

use super::push::AppDeployer;

/// Everything one orchestration run needs from the caller.
#[derive(Debug, Clone)]
pub struct DeployRequest {
    pub source: Source,
    pub target: Target,
    /// Operator-supplied environment values, keyed by variable name.
    pub values: HashMap<String, String>,
    /// Upper bound on waiting for each backing service.
    pub service_timeout: Duration,
}

/// Successful outcome of a run.
#[derive(Debug, Clone)]
pub struct Deployed {
    pub app: AppName,
    pub route: String,
}

/// Runs one deployment request end-to-end. Stateless across runs: every run
/// starts from a fresh temporary directory and discards it on return.
pub struct Orchestrator<C, R> {
    config: PlatformConfig,
    repo: C,
    runner: R,
    http: reqwest::Client,
    cancel: CancellationToken,
}

impl<C: RepoContent, R: CommandRunner> Orchestrator<C, R> {
    pub fn new(config: PlatformConfig, repo: C, runner: R) -> Self {
        Self {
            config,
            repo,
            runner,
            http: reqwest::Client::new(),
            cancel: CancellationToken::new(),
        }
    }

    /// Thread an external cancellation signal through the long waits. The
    /// per-service timeout remains the fallback bound.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub async fn deploy(
        &self,
        token: &TokenPair,
        request: &DeployRequest,
        output: &Output,
    ) -> Result<Deployed> {
        let mut diag = Diagnostics::default();
        let result = self.run(token, request, output, &mut diag).await;

        for warning in diag.warnings() {
            output.warning(&warning.message);
        }

        result
    }

    async fn run(
        &self,
        token: &TokenPair,
        request: &DeployRequest,
        output: &Output,
        diag: &mut Diagnostics,
    ) -> Result<Deployed> {
        let source = &request.source;
        let target = &request.target;

        output.progress(&format!(
            "Deploying {}/{}@{} to {}/{}",
            source.owner, source.repo, source.reference, target.org_name, target.space_name
        ));

        output.progress("  → Loading deployment manifest...");
        let mut descriptor = manifest::load(&self.repo, source).await?;
        descriptor.apply_values(&request.values);

        let missing = descriptor.missing_required();
        if !missing.is_empty() {
            return Err(Error::MissingValues(missing));
        }

        // One private tempdir per run; its path uniqueness is what keeps
        // concurrent runs from ever sharing CLI state.
        let workdir = tempfile::tempdir()?;
        let session_home = workdir.path().join("env");
        let bundle_root = workdir.path().join("app");
        fs::create_dir(&session_home)?;
        fs::create_dir(&bundle_root)?;

        output.progress("  → Downloading source archive...");
        let archive_url = self
            .repo
            .archive_url(source)
            .await
            .map_err(ArchiveError::Source)?;
        let root_dir = archive::fetch_and_unpack(&self.http, &archive_url, &bundle_root).await?;
        let bundle = bundle_root.join(&root_dir);
        let manifest_path = bundle.join(manifest::APP_MANIFEST_FILENAME);

        output.progress("  → Injecting environment values...");
        let mut app_manifest = AppManifest::load(&manifest_path)?;
        for (name, value) in descriptor.supplied_env() {
            app_manifest.set_env(name, value);
        }
        app_manifest.save(&manifest_path)?;

        output.progress("  → Writing isolated CLI session...");
        let session = TargetSession::write(&self.config, token, target, &session_home)?;

        if !descriptor.services.is_empty() {
            output.progress(&format!(
                "  → Provisioning {} service instance(s)...",
                descriptor.services.len()
            ));
        }
        let probe = LineMatchProbe::new(&self.runner);
        let provisioner = Provisioner::new(
            &self.runner,
            &probe,
            session.home(),
            request.service_timeout,
        )
        .with_cancellation(self.cancel.clone());
        provisioner.provision_all(&descriptor.services, diag).await?;

        let app = AppName::from_repo(&source.repo);
        output.progress(&format!("  → Pushing {app}..."));
        let deployer = AppDeployer::new(&self.runner, session.home());
        deployer.push(&app, &manifest_path, &bundle).await?;

        output.progress("  → Discovering route...");
        let route = deployer.discover_route(&app).await?;

        if let Err(e) = workdir.close() {
            diag.warn(Warning::workdir_cleanup(format!(
                "failed to remove working directory: {e}"
            )));
        }

        Ok(Deployed { app, route })
    }
}
