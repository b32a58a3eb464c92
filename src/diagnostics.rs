// ABOUTME: Diagnostics accumulator for non-fatal warnings during a deployment run.
// ABOUTME: Collects conditions that should reach the operator without failing the run.

use crate::types::InstanceLabel;

/// Collects non-fatal warnings during orchestration.
#[derive(Default)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    /// Record a warning, auto-logging it via tracing.
    pub fn warn(&mut self, warning: Warning) {
        tracing::warn!("{}", warning.message);
        self.warnings.push(warning);
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// A non-fatal warning collected during orchestration.
#[derive(Debug, Clone)]
pub struct Warning {
    pub kind: WarningKind,
    pub message: String,
}

impl Warning {
    /// Provisioned instances deliberately left in place after a failed run.
    pub fn instances_left(labels: &[&InstanceLabel]) -> Self {
        let names: Vec<&str> = labels.iter().map(|l| l.as_str()).collect();
        Self {
            kind: WarningKind::InstancesLeft,
            message: format!(
                "leaving already-provisioned service instances in place: {}",
                names.join(", ")
            ),
        }
    }

    /// The run's working directory could not be removed.
    pub fn workdir_cleanup(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::WorkdirCleanup,
            message: message.into(),
        }
    }
}

/// Categories of warnings a run can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    /// Service instances left behind by the fail-fast, no-rollback policy.
    InstancesLeft,
    /// Temporary working directory removal failed.
    WorkdirCleanup,
}
