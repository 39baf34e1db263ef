// ABOUTME: Ordered step log for multi-call lifecycle operations.
// ABOUTME: Completed steps are reported on failure; nothing is compensated automatically.

use serde::Serialize;
use std::fmt;
use tracing::error;

use crate::provider::ProviderError;
use crate::types::ComponentName;

use super::error::OrchestratorError;

/// Lifecycle operation a step belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Operation {
    Deploy,
    RollUpdate,
    RollBack,
    Scale,
    Remove,
    ListBuilds,
    ReplicaCount,
    AccessSummary,
    PurgeImage,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Deploy => "deploy",
            Operation::RollUpdate => "rolling update",
            Operation::RollBack => "rollback",
            Operation::Scale => "scale",
            Operation::Remove => "remove",
            Operation::ListBuilds => "list builds",
            Operation::ReplicaCount => "replica count",
            Operation::AccessSummary => "access summary",
            Operation::PurgeImage => "purge image",
        };
        write!(f, "{}", name)
    }
}

/// One provider-facing step of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Step {
    QueryImages,
    BuildImage,
    AwaitImage,
    LookupWorkload,
    CreateWorkload,
    UpdateImage,
    ListInstances,
    PruneInstances,
    ScaleReplicas,
    DeleteWorkload,
    DeleteInstances,
    LookupService,
    AllocatePort,
    CreateService,
    DeleteService,
    RemoveImage,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::QueryImages => "query images",
            Step::BuildImage => "build image",
            Step::AwaitImage => "await image",
            Step::LookupWorkload => "look up workload",
            Step::CreateWorkload => "create workload",
            Step::UpdateImage => "update image",
            Step::ListInstances => "list instances",
            Step::PruneInstances => "prune instances",
            Step::ScaleReplicas => "scale replicas",
            Step::DeleteWorkload => "delete workload",
            Step::DeleteInstances => "delete instances",
            Step::LookupService => "look up service",
            Step::AllocatePort => "allocate port",
            Step::CreateService => "create service",
            Step::DeleteService => "delete service",
            Step::RemoveImage => "remove image",
        };
        write!(f, "{}", name)
    }
}

/// Render steps as a comma separated list for error messages.
pub(crate) fn describe_steps(steps: &[Step]) -> String {
    if steps.is_empty() {
        return "none".to_string();
    }
    steps
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Progress of one operation on one component.
#[derive(Debug, Clone)]
pub struct StepLog {
    operation: Operation,
    component: String,
    completed: Vec<Step>,
}

impl StepLog {
    pub fn new(operation: Operation, component: &ComponentName) -> Self {
        Self {
            operation,
            component: component.to_string(),
            completed: Vec::new(),
        }
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn component(&self) -> &str {
        &self.component
    }

    pub fn completed(&self) -> &[Step] {
        &self.completed
    }

    /// Repeated steps (one prune per instance) are recorded once.
    pub fn record(&mut self, step: Step) {
        if self.completed.last() != Some(&step) {
            self.completed.push(step);
        }
    }

    /// Record the step on success, or turn the provider error into an
    /// operation error carrying everything completed so far.
    pub fn track<T, E>(&mut self, step: Step, result: Result<T, E>) -> Result<T, OrchestratorError>
    where
        E: Into<ProviderError>,
    {
        match result {
            Ok(value) => {
                self.record(step);
                Ok(value)
            }
            Err(e) => Err(self.fail(step, e.into())),
        }
    }

    pub(crate) fn fail(&self, step: Step, source: ProviderError) -> OrchestratorError {
        error!(
            operation = %self.operation,
            component = %self.component,
            step = %step,
            completed = %describe_steps(&self.completed),
            error = %source,
            "step failed"
        );
        OrchestratorError::Provider {
            operation: self.operation,
            component: self.component.clone(),
            step,
            completed: self.completed.clone(),
            source,
        }
    }
}
