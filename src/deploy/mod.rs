// ABOUTME: Deployment orchestration for tenant web applications.
// ABOUTME: Lifecycle operations, build listings, typestate deploy sequence and step log.

mod deployment;
mod error;
mod orchestrator;
mod state;
mod steps;
mod transitions;
mod visibility;

pub use deployment::{DeployOutcome, DeployPlan, Deployment};
pub use error::{OrchestratorError, OrchestratorErrorKind};
pub use orchestrator::{Clock, Orchestrator, artifact_name};
pub use state::{Exposed, ImageBuilt, ImageVisible, Planned, WorkloadCreated};
pub use steps::{Operation, Step, StepLog};
pub use visibility::{DEFAULT_MAX_WAIT, DEFAULT_POLL_INTERVAL, ImageVisibility};
