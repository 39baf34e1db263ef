// ABOUTME: Collaborator contracts for images, workloads and services, plus concrete adapters.
// ABOUTME: Bollard builds images locally; kube drives ReplicationControllers and Services.

pub mod bollard;
pub mod detection;
mod image;
pub mod kube;
mod service;
mod workload;

pub use self::bollard::{BollardImageBuilder, DockerfileTemplate};
pub use self::kube::{ClusterError, KubeServiceRegistry, KubeWorkloadController};
pub use detection::{DetectionError, RuntimeConfig, RuntimeInfo, RuntimeType};
pub use image::{BuildRequest, ImageBuilder, ImageError, ImageSummary};
pub use service::{ServiceError, ServiceRecord, ServiceRegistry, ServiceSpec};
pub use workload::{InstanceRecord, WorkloadController, WorkloadError, WorkloadRecord, WorkloadSpec};

/// Failure of any collaborator call.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error(transparent)]
    Image(#[from] ImageError),

    #[error(transparent)]
    Workload(#[from] WorkloadError),

    #[error(transparent)]
    Service(#[from] ServiceError),
}
