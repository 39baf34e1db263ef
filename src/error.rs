// ABOUTME: Application-wide error types for webdeploy.
// ABOUTME: Uses thiserror for ergonomic error handling.

use std::path::PathBuf;
use thiserror::Error;

use crate::deploy::OrchestratorError;
use crate::ports::PortError;
use crate::provider::{ClusterError, DetectionError};
use crate::types::NameError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("file already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error("configuration file not found in {0}")]
    ConfigNotFound(PathBuf),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The operation did not apply to the current cluster state.
    #[error("{0}")]
    NotApplicable(String),

    #[error(transparent)]
    InvalidName(#[from] NameError),

    #[error(transparent)]
    Orchestrator(#[from] OrchestratorError),

    #[error("container engine: {0}")]
    Engine(#[from] DetectionError),

    #[error(transparent)]
    Cluster(#[from] ClusterError),

    #[error("node port state: {0}")]
    Port(#[from] PortError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
