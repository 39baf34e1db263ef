// ABOUTME: Service registry contract: one externally exposed service per component.
// ABOUTME: Resolves the in-cluster and external addresses of a deployed application.

use crate::types::ComponentName;
use async_trait::async_trait;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSpec {
    pub id: ComponentName,
    /// Selector label value of the instances behind the service.
    pub name: String,
    pub node_port: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceRecord {
    pub id: String,
    pub cluster_ip: Option<String>,
    pub node_port: Option<u16>,
}

#[async_trait]
pub trait ServiceRegistry: Send + Sync {
    async fn create(&self, spec: &ServiceSpec) -> Result<(), ServiceError>;

    async fn get(&self, id: &ComponentName) -> Result<Option<ServiceRecord>, ServiceError>;

    /// `host:port` reachable from inside the cluster.
    async fn cluster_address(&self, id: &ComponentName) -> Result<Option<String>, ServiceError>;

    /// `host:port` reachable from outside the cluster.
    async fn external_address(&self, id: &ComponentName) -> Result<Option<String>, ServiceError>;

    /// Deleting a service that does not exist succeeds.
    async fn delete(&self, id: &ComponentName) -> Result<(), ServiceError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("service not found: {0}")]
    NotFound(String),

    #[error("service already exists: {0}")]
    AlreadyExists(String),

    #[error("node port unavailable: {0}")]
    PortUnavailable(String),

    #[error("cluster error: {0}")]
    Runtime(String),
}
