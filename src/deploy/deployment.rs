// ABOUTME: Deploy sequence parameterized by state marker.
// ABOUTME: Build, await, create workload and expose can only happen in that order.

use std::path::PathBuf;

use crate::types::{AppName, ComponentName, TenantName};

use super::state::{Exposed, ImageBuilt, ImageVisible, Planned, WorkloadCreated};
use super::steps::{Step, StepLog};

/// Inputs of one first-time deployment.
#[derive(Debug, Clone)]
pub struct DeployPlan {
    pub tenant: TenantName,
    pub app: AppName,
    pub component: ComponentName,
    pub artifact: PathBuf,
    /// Version tag with the date/time suffix already applied.
    pub version: String,
    pub replicas: u32,
}

/// A deployment in progress. The state parameter carries what earlier
/// steps produced; the log records them for error reporting.
#[derive(Debug)]
#[must_use = "deployment state must be used"]
pub struct Deployment<S> {
    pub(crate) plan: DeployPlan,
    pub(crate) log: StepLog,
    pub(crate) state: S,
}

/// Result of a completed deploy sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployOutcome {
    pub component: ComponentName,
    pub image: String,
    /// Port allocated for a new service; `None` if one already existed.
    pub node_port: Option<u16>,
    pub steps: Vec<Step>,
}

impl Deployment<Planned> {
    /// Continue the log of the operation that decided to deploy.
    pub fn new(plan: DeployPlan, log: StepLog) -> Self {
        Deployment {
            plan,
            log,
            state: Planned,
        }
    }
}

impl<S> Deployment<S> {
    pub fn plan(&self) -> &DeployPlan {
        &self.plan
    }

    pub fn component(&self) -> &ComponentName {
        &self.plan.component
    }

    pub fn completed_steps(&self) -> &[Step] {
        self.log.completed()
    }
}

impl Deployment<ImageBuilt> {
    pub fn image(&self) -> &str {
        &self.state.image
    }
}

impl Deployment<ImageVisible> {
    pub fn image(&self) -> &str {
        &self.state.image
    }

    /// Whether the image builder confirmed the image rather than a delay elapsing.
    pub fn confirmed(&self) -> bool {
        self.state.confirmed
    }
}

impl Deployment<WorkloadCreated> {
    pub fn image(&self) -> &str {
        &self.state.image
    }
}

impl Deployment<Exposed> {
    pub fn image(&self) -> &str {
        &self.state.image
    }

    pub fn node_port(&self) -> Option<u16> {
        self.state.node_port
    }

    pub fn finish(self) -> DeployOutcome {
        DeployOutcome {
            component: self.plan.component,
            image: self.state.image,
            node_port: self.state.node_port,
            steps: self.log.completed().to_vec(),
        }
    }
}
