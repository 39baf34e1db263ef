// ABOUTME: Workload controller contract: a replica-managed set of instances per component.
// ABOUTME: The live workload is the only record that a deployment exists.

use crate::types::ComponentName;
use async_trait::async_trait;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkloadSpec {
    pub name: ComponentName,
    /// Value of the selector label carried by every instance.
    pub label: String,
    pub image: String,
    pub replicas: u32,
}

/// Live state of a workload as reported by the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkloadRecord {
    pub name: String,
    /// Image of the first container in the instance template.
    pub image: String,
    pub replicas: u32,
}

/// One running replica.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceRecord {
    pub name: String,
    pub image: String,
}

#[async_trait]
pub trait WorkloadController: Send + Sync {
    async fn create(&self, spec: &WorkloadSpec) -> Result<(), WorkloadError>;

    /// `Ok(None)` when no workload carries the name.
    async fn get(&self, name: &ComponentName) -> Result<Option<WorkloadRecord>, WorkloadError>;

    async fn update_replica_count(
        &self,
        name: &ComponentName,
        replicas: u32,
    ) -> Result<(), WorkloadError>;

    async fn update_image(&self, name: &ComponentName, image: &str) -> Result<(), WorkloadError>;

    async fn delete(&self, name: &ComponentName) -> Result<(), WorkloadError>;

    /// Delete every instance whose selector label equals the component name.
    async fn delete_instances_matching_label(
        &self,
        name: &ComponentName,
    ) -> Result<(), WorkloadError>;

    /// Instances selected by the component's label.
    async fn list_instances(
        &self,
        name: &ComponentName,
    ) -> Result<Vec<InstanceRecord>, WorkloadError>;

    async fn delete_instance(&self, instance: &str) -> Result<(), WorkloadError>;
}

#[derive(Debug, thiserror::Error)]
pub enum WorkloadError {
    #[error("workload not found: {0}")]
    NotFound(String),

    #[error("workload already exists: {0}")]
    AlreadyExists(String),

    #[error("invalid workload: {0}")]
    Invalid(String),

    #[error("cluster error: {0}")]
    Runtime(String),
}
