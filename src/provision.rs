// ABOUTME: Backing service provisioning: sequential creation plus a bounded poll loop.
// ABOUTME: Per instance: Requested -> poll -> Ready | TimedOut | RequestFailed.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::diagnostics::{Diagnostics, Warning};
use crate::manifest::ServiceSpec;
use crate::runner::CommandRunner;
use crate::types::InstanceLabel;

/// Delay between readiness queries.
pub const POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Status line the platform CLI prints once an instance finishes creating.
pub const READY_STATUS_LINE: &str = "Status: create succeeded";

#[derive(Debug, Error)]
#[error("service {label}: {failure}")]
pub struct ProvisionError {
    pub label: InstanceLabel,
    #[source]
    pub failure: ProvisionFailure,
}

#[derive(Debug, Error)]
pub enum ProvisionFailure {
    /// Creation issuance itself failed. Never retried.
    #[error("creation request failed: {0}")]
    RequestFailed(String),

    /// Instance never reported ready inside the caller-supplied limit.
    #[error("instance not ready within {}s", .0.as_secs())]
    TimedOut(Duration),

    /// The wait was cancelled from outside before the timeout fired.
    #[error("wait cancelled")]
    Cancelled,

    #[error("invalid service config: {0}")]
    BadConfig(#[from] serde_json::Error),
}

/// Lifecycle of one instance as the provisioner sees it. `Requested` is
/// entered after successful issuance; the other three are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceState {
    Requested,
    Ready,
    TimedOut,
    RequestFailed,
}

/// One readiness observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    Ready,
    Pending,
}

/// How the provisioner learns whether an instance is ready. Kept separate
/// from the poll loop so a structured status API can replace output
/// scraping without touching the state machine.
#[async_trait]
pub trait ServiceProbe: Send + Sync {
    /// Take one status observation. Transient query failures count as
    /// `Pending`; the poll loop keeps going.
    async fn observe(&self, home: &Path, label: &InstanceLabel) -> Observation;
}

/// Probe that scans the CLI's line-oriented status output for the exact
/// creation-succeeded line.
pub struct LineMatchProbe<'r, R: ?Sized> {
    runner: &'r R,
}

impl<'r, R: CommandRunner + ?Sized> LineMatchProbe<'r, R> {
    pub fn new(runner: &'r R) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl<R: CommandRunner + ?Sized> ServiceProbe for LineMatchProbe<'_, R> {
    async fn observe(&self, home: &Path, label: &InstanceLabel) -> Observation {
        let args = vec!["service".to_string(), label.to_string()];
        match self.runner.run(home, &args).await {
            Ok(output) if output.success => {
                if output.lines().any(|line| line == READY_STATUS_LINE) {
                    Observation::Ready
                } else {
                    Observation::Pending
                }
            }
            Ok(_) => Observation::Pending,
            Err(err) => {
                tracing::warn!(%label, error = %err, "status query failed, treating as pending");
                Observation::Pending
            }
        }
    }
}

/// Provisions a descriptor's services strictly in declaration order.
pub struct Provisioner<'a, R: ?Sized, P: ?Sized> {
    runner: &'a R,
    probe: &'a P,
    home: &'a Path,
    timeout: Duration,
    cancel: CancellationToken,
}

impl<'a, R, P> Provisioner<'a, R, P>
where
    R: CommandRunner + ?Sized,
    P: ServiceProbe + ?Sized,
{
    pub fn new(runner: &'a R, probe: &'a P, home: &'a Path, timeout: Duration) -> Self {
        Self {
            runner,
            probe,
            home,
            timeout,
            cancel: CancellationToken::new(),
        }
    }

    /// Thread an external cancellation signal through the poll loop. The
    /// timeout stays in force as the fallback bound.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Create every service and wait for each to become ready, failing fast
    /// on the first that does not. Already-created instances stay in place:
    /// partial state aids debugging and the platform namespaces by space.
    pub async fn provision_all(
        &self,
        services: &[ServiceSpec],
        diag: &mut Diagnostics,
    ) -> Result<(), ProvisionError> {
        let mut created: Vec<&InstanceLabel> = Vec::new();

        for spec in services {
            match self.provision(spec).await {
                Ok(()) => created.push(&spec.label),
                Err(err) => {
                    if !created.is_empty() {
                        diag.warn(Warning::instances_left(&created));
                    }
                    return Err(err);
                }
            }
        }

        Ok(())
    }

    async fn provision(&self, spec: &ServiceSpec) -> Result<(), ProvisionError> {
        let fail = |failure| ProvisionError {
            label: spec.label.clone(),
            failure,
        };

        let args = create_args(spec).map_err(|e| fail(ProvisionFailure::BadConfig(e)))?;

        let output = self
            .runner
            .run(self.home, &args)
            .await
            .map_err(|e| fail(ProvisionFailure::RequestFailed(e.to_string())))?;

        if !output.success {
            let reason = match output.exit_code {
                Some(code) => format!("CLI exited with status {code}"),
                None => "CLI terminated by signal".to_string(),
            };
            return Err(fail(ProvisionFailure::RequestFailed(reason)));
        }

        tracing::info!(label = %spec.label, state = ?InstanceState::Requested, "service creation accepted");
        self.await_ready(&spec.label).await
    }

    async fn await_ready(&self, label: &InstanceLabel) -> Result<(), ProvisionError> {
        let mut elapsed = Duration::ZERO;

        loop {
            if self.probe.observe(self.home, label).await == Observation::Ready {
                tracing::info!(%label, state = ?InstanceState::Ready, "service instance ready");
                return Ok(());
            }

            elapsed += POLL_INTERVAL;
            if elapsed > self.timeout {
                tracing::warn!(%label, state = ?InstanceState::TimedOut, "gave up waiting");
                return Err(ProvisionError {
                    label: label.clone(),
                    failure: ProvisionFailure::TimedOut(self.timeout),
                });
            }

            tokio::select! {
                _ = self.cancel.cancelled() => {
                    return Err(ProvisionError {
                        label: label.clone(),
                        failure: ProvisionFailure::Cancelled,
                    });
                }
                _ = tokio::time::sleep(POLL_INTERVAL) => {}
            }
        }
    }
}

fn create_args(spec: &ServiceSpec) -> Result<Vec<String>, serde_json::Error> {
    let mut args = vec![
        "create-service".to_string(),
        spec.offering.clone(),
        spec.plan.clone(),
        spec.label.to_string(),
    ];

    if !spec.tags.is_empty() {
        args.push("-t".to_string());
        args.push(spec.tags.join(","));
    }

    if !spec.config.is_empty() {
        args.push("-c".to_string());
        args.push(serde_json::to_string(&spec.config)?);
    }

    Ok(args)
}
