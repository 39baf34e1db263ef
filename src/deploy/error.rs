// ABOUTME: Orchestrator error types with SNAFU pattern.
// ABOUTME: Carries operation, component and step progress for manual reconciliation.

use snafu::Snafu;

use crate::ports::PortError;
use crate::provider::ProviderError;
use crate::types::{NameError, ParseBuildIdError};

use super::steps::{Operation, Step, describe_steps};

/// Failure of a lifecycle operation. Precondition misses are not errors;
/// operations report them as `Ok(false)`.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum OrchestratorError {
    #[snafu(display(
        "{operation} {component}: {step} failed after [{}]: {source}",
        describe_steps(completed)
    ))]
    Provider {
        operation: Operation,
        component: String,
        step: Step,
        completed: Vec<Step>,
        source: ProviderError,
    },

    #[snafu(display(
        "{operation} {component}: node port allocation failed after [{}]: {source}",
        describe_steps(completed)
    ))]
    PortAllocation {
        operation: Operation,
        component: String,
        completed: Vec<Step>,
        source: PortError,
    },

    #[snafu(display("invalid name: {source}"))]
    InvalidName { source: NameError },

    #[snafu(display("invalid build identifier: {source}"))]
    InvalidBuildId { source: ParseBuildIdError },

    #[snafu(display("build {build} does not belong to {repository}"))]
    ForeignBuild { build: String, repository: String },
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrchestratorErrorKind {
    /// Image builder call failed.
    Image,
    /// Workload controller call failed.
    Workload,
    /// Service registry call failed.
    Service,
    /// Node port state could not be persisted or read.
    PortAllocation,
    /// Caller supplied a name or build identifier that cannot be used.
    InvalidInput,
}

impl OrchestratorError {
    pub fn kind(&self) -> OrchestratorErrorKind {
        match self {
            OrchestratorError::Provider { source, .. } => match source {
                ProviderError::Image(_) => OrchestratorErrorKind::Image,
                ProviderError::Workload(_) => OrchestratorErrorKind::Workload,
                ProviderError::Service(_) => OrchestratorErrorKind::Service,
            },
            OrchestratorError::PortAllocation { .. } => OrchestratorErrorKind::PortAllocation,
            OrchestratorError::InvalidName { .. }
            | OrchestratorError::InvalidBuildId { .. }
            | OrchestratorError::ForeignBuild { .. } => OrchestratorErrorKind::InvalidInput,
        }
    }

    /// Steps that finished before the failure; their resources were left in place.
    pub fn completed_steps(&self) -> &[Step] {
        match self {
            OrchestratorError::Provider { completed, .. }
            | OrchestratorError::PortAllocation { completed, .. } => completed,
            _ => &[],
        }
    }

    pub fn failed_step(&self) -> Option<Step> {
        match self {
            OrchestratorError::Provider { step, .. } => Some(*step),
            OrchestratorError::PortAllocation { .. } => Some(Step::AllocatePort),
            _ => None,
        }
    }
}
