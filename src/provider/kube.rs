// ABOUTME: Kubernetes adapters: ReplicationController workloads and NodePort services.
// ABOUTME: Instances are selected by the "name" label set to the component name.

use crate::provider::service::{ServiceError, ServiceRecord, ServiceRegistry, ServiceSpec};
use crate::provider::workload::{
    InstanceRecord, WorkloadController, WorkloadError, WorkloadRecord, WorkloadSpec,
};
use crate::types::ComponentName;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{
    Container, ContainerPort, Pod, PodSpec, PodTemplateSpec, ReplicationController,
    ReplicationControllerSpec, Service, ServicePort, ServiceSpec as KubeServiceSpec,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use kube::Client;
use kube::api::{Api, DeleteParams, ListParams, Patch, PatchParams, PostParams};
use std::collections::BTreeMap;
use tracing::debug;

/// Label key selecting a component's instances.
pub const SELECTOR_LABEL: &str = "name";

const SERVICE_PORT_NAME: &str = "http-1";

#[derive(Debug, thiserror::Error)]
pub enum ClusterError {
    #[error("invalid cluster endpoint {endpoint}: {message}")]
    InvalidEndpoint { endpoint: String, message: String },

    #[error("failed to create cluster client: {0}")]
    Client(String),
}

/// Client for an explicit API endpoint, or from kubeconfig / in-cluster config.
///
/// An explicit endpoint is used without credentials, which suits an
/// insecure local API port or `kubectl proxy`.
pub async fn connect(endpoint: Option<&str>) -> Result<Client, ClusterError> {
    match endpoint {
        Some(endpoint) => {
            let config = endpoint
                .parse()
                .map(kube::Config::new)
                .map_err(|e| ClusterError::InvalidEndpoint {
                    endpoint: endpoint.to_string(),
                    message: e.to_string(),
                })?;
            Client::try_from(config).map_err(|e| ClusterError::Client(e.to_string()))
        }
        None => Client::try_default()
            .await
            .map_err(|e| ClusterError::Client(e.to_string())),
    }
}

fn selector(label: &str) -> BTreeMap<String, String> {
    BTreeMap::from([(SELECTOR_LABEL.to_string(), label.to_string())])
}

fn label_query(name: &ComponentName) -> ListParams {
    ListParams::default().labels(&format!("{}={}", SELECTOR_LABEL, name))
}

// =============================================================================
// Error Mapping Helpers
// =============================================================================

fn map_workload_error(e: kube::Error, name: &str) -> WorkloadError {
    match &e {
        kube::Error::Api(ae) if ae.code == 404 => WorkloadError::NotFound(name.to_string()),
        kube::Error::Api(ae) if ae.code == 409 => WorkloadError::AlreadyExists(name.to_string()),
        kube::Error::Api(ae) if ae.code == 422 => {
            WorkloadError::Invalid(format!("{}: {}", name, ae.message))
        }
        _ => WorkloadError::Runtime(format!("{}: {}", name, e)),
    }
}

fn map_service_error(e: kube::Error, id: &str) -> ServiceError {
    match &e {
        kube::Error::Api(ae) if ae.code == 404 => ServiceError::NotFound(id.to_string()),
        kube::Error::Api(ae) if ae.code == 409 => ServiceError::AlreadyExists(id.to_string()),
        kube::Error::Api(ae) if ae.code == 422 && ae.message.contains("port") => {
            ServiceError::PortUnavailable(format!("{}: {}", id, ae.message))
        }
        _ => ServiceError::Runtime(format!("{}: {}", id, e)),
    }
}

fn replicas_to_api(name: &ComponentName, replicas: u32) -> Result<i32, WorkloadError> {
    i32::try_from(replicas)
        .map_err(|_| WorkloadError::Invalid(format!("{}: replica count {} too large", name, replicas)))
}

// =============================================================================
// KubeWorkloadController
// =============================================================================

pub struct KubeWorkloadController {
    client: Client,
    namespace: String,
    container_port: u16,
}

impl KubeWorkloadController {
    pub fn new(client: Client, namespace: impl Into<String>, container_port: u16) -> Self {
        Self {
            client,
            namespace: namespace.into(),
            container_port,
        }
    }

    fn controllers(&self) -> Api<ReplicationController> {
        Api::namespaced(self.client.clone(), &self.namespace)
    }

    fn pods(&self) -> Api<Pod> {
        Api::namespaced(self.client.clone(), &self.namespace)
    }
}

fn first_container_image(spec: Option<&PodSpec>) -> String {
    spec.and_then(|s| s.containers.first())
        .and_then(|c| c.image.clone())
        .unwrap_or_default()
}

#[async_trait]
impl WorkloadController for KubeWorkloadController {
    async fn create(&self, spec: &WorkloadSpec) -> Result<(), WorkloadError> {
        let labels = selector(&spec.label);
        let rc = ReplicationController {
            metadata: ObjectMeta {
                name: Some(spec.name.to_string()),
                labels: Some(labels.clone()),
                ..Default::default()
            },
            spec: Some(ReplicationControllerSpec {
                replicas: Some(replicas_to_api(&spec.name, spec.replicas)?),
                selector: Some(labels.clone()),
                template: Some(PodTemplateSpec {
                    metadata: Some(ObjectMeta {
                        labels: Some(labels),
                        ..Default::default()
                    }),
                    spec: Some(PodSpec {
                        containers: vec![Container {
                            name: spec.name.to_string(),
                            image: Some(spec.image.clone()),
                            ports: Some(vec![ContainerPort {
                                container_port: i32::from(self.container_port),
                                ..Default::default()
                            }]),
                            ..Default::default()
                        }],
                        ..Default::default()
                    }),
                }),
                ..Default::default()
            }),
            ..Default::default()
        };

        self.controllers()
            .create(&PostParams::default(), &rc)
            .await
            .map_err(|e| map_workload_error(e, spec.name.as_str()))?;
        debug!(component = %spec.name, image = %spec.image, replicas = spec.replicas, "created replication controller");
        Ok(())
    }

    async fn get(&self, name: &ComponentName) -> Result<Option<WorkloadRecord>, WorkloadError> {
        let rc = self
            .controllers()
            .get_opt(name.as_str())
            .await
            .map_err(|e| map_workload_error(e, name.as_str()))?;

        Ok(rc.map(|rc| {
            let spec = rc.spec.unwrap_or_default();
            let replicas = spec.replicas.unwrap_or(1);
            WorkloadRecord {
                name: rc.metadata.name.unwrap_or_else(|| name.to_string()),
                image: first_container_image(
                    spec.template.as_ref().and_then(|t| t.spec.as_ref()),
                ),
                replicas: u32::try_from(replicas).unwrap_or(0),
            }
        }))
    }

    async fn update_replica_count(
        &self,
        name: &ComponentName,
        replicas: u32,
    ) -> Result<(), WorkloadError> {
        let patch = serde_json::json!({
            "spec": { "replicas": replicas_to_api(name, replicas)? }
        });
        self.controllers()
            .patch(name.as_str(), &PatchParams::default(), &Patch::Merge(&patch))
            .await
            .map_err(|e| map_workload_error(e, name.as_str()))?;
        Ok(())
    }

    async fn update_image(&self, name: &ComponentName, image: &str) -> Result<(), WorkloadError> {
        let api = self.controllers();
        let mut rc = api
            .get(name.as_str())
            .await
            .map_err(|e| map_workload_error(e, name.as_str()))?;

        let container = rc
            .spec
            .as_mut()
            .and_then(|s| s.template.as_mut())
            .and_then(|t| t.spec.as_mut())
            .and_then(|p| p.containers.first_mut())
            .ok_or_else(|| {
                WorkloadError::Invalid(format!("{}: workload has no container", name))
            })?;
        container.image = Some(image.to_string());

        api.replace(name.as_str(), &PostParams::default(), &rc)
            .await
            .map_err(|e| map_workload_error(e, name.as_str()))?;
        Ok(())
    }

    async fn delete(&self, name: &ComponentName) -> Result<(), WorkloadError> {
        self.controllers()
            .delete(name.as_str(), &DeleteParams::default())
            .await
            .map_err(|e| map_workload_error(e, name.as_str()))?;
        Ok(())
    }

    async fn delete_instances_matching_label(
        &self,
        name: &ComponentName,
    ) -> Result<(), WorkloadError> {
        self.pods()
            .delete_collection(&DeleteParams::default(), &label_query(name))
            .await
            .map_err(|e| map_workload_error(e, name.as_str()))?;
        Ok(())
    }

    async fn list_instances(
        &self,
        name: &ComponentName,
    ) -> Result<Vec<InstanceRecord>, WorkloadError> {
        let pods = self
            .pods()
            .list(&label_query(name))
            .await
            .map_err(|e| map_workload_error(e, name.as_str()))?;

        Ok(pods
            .items
            .into_iter()
            .filter_map(|pod| {
                let image = first_container_image(pod.spec.as_ref());
                pod.metadata
                    .name
                    .map(|name| InstanceRecord { name, image })
            })
            .collect())
    }

    async fn delete_instance(&self, instance: &str) -> Result<(), WorkloadError> {
        match self.pods().delete(instance, &DeleteParams::default()).await {
            Ok(_) => Ok(()),
            // Already replaced by the controller.
            Err(kube::Error::Api(ae)) if ae.code == 404 => Ok(()),
            Err(e) => Err(map_workload_error(e, instance)),
        }
    }
}

// =============================================================================
// KubeServiceRegistry
// =============================================================================

pub struct KubeServiceRegistry {
    client: Client,
    namespace: String,
    container_port: u16,
    external_host: String,
}

impl KubeServiceRegistry {
    pub fn new(
        client: Client,
        namespace: impl Into<String>,
        container_port: u16,
        external_host: impl Into<String>,
    ) -> Self {
        Self {
            client,
            namespace: namespace.into(),
            container_port,
            external_host: external_host.into(),
        }
    }

    fn services(&self) -> Api<Service> {
        Api::namespaced(self.client.clone(), &self.namespace)
    }
}

#[async_trait]
impl ServiceRegistry for KubeServiceRegistry {
    async fn create(&self, spec: &ServiceSpec) -> Result<(), ServiceError> {
        let port = i32::from(self.container_port);
        let service = Service {
            metadata: ObjectMeta {
                name: Some(spec.id.to_string()),
                labels: Some(selector(&spec.name)),
                ..Default::default()
            },
            spec: Some(KubeServiceSpec {
                type_: Some("NodePort".to_string()),
                selector: Some(selector(&spec.name)),
                session_affinity: Some("None".to_string()),
                ports: Some(vec![ServicePort {
                    name: Some(SERVICE_PORT_NAME.to_string()),
                    protocol: Some("TCP".to_string()),
                    port,
                    target_port: Some(IntOrString::Int(port)),
                    node_port: Some(i32::from(spec.node_port)),
                    ..Default::default()
                }]),
                ..Default::default()
            }),
            ..Default::default()
        };

        self.services()
            .create(&PostParams::default(), &service)
            .await
            .map_err(|e| map_service_error(e, spec.id.as_str()))?;
        debug!(component = %spec.id, node_port = spec.node_port, "created service");
        Ok(())
    }

    async fn get(&self, id: &ComponentName) -> Result<Option<ServiceRecord>, ServiceError> {
        let service = self
            .services()
            .get_opt(id.as_str())
            .await
            .map_err(|e| map_service_error(e, id.as_str()))?;

        Ok(service.map(|service| {
            let spec = service.spec.unwrap_or_default();
            let node_port = spec
                .ports
                .as_ref()
                .and_then(|ports| ports.first())
                .and_then(|p| p.node_port)
                .and_then(|p| u16::try_from(p).ok());
            let cluster_ip = spec
                .cluster_ip
                .filter(|ip| !ip.is_empty() && ip != "None");
            ServiceRecord {
                id: service.metadata.name.unwrap_or_else(|| id.to_string()),
                cluster_ip,
                node_port,
            }
        }))
    }

    async fn cluster_address(&self, id: &ComponentName) -> Result<Option<String>, ServiceError> {
        Ok(self
            .get(id)
            .await?
            .and_then(|record| record.cluster_ip)
            .map(|ip| format!("{}:{}", ip, self.container_port)))
    }

    async fn external_address(&self, id: &ComponentName) -> Result<Option<String>, ServiceError> {
        Ok(self
            .get(id)
            .await?
            .and_then(|record| record.node_port)
            .map(|port| format!("{}:{}", self.external_host, port)))
    }

    async fn delete(&self, id: &ComponentName) -> Result<(), ServiceError> {
        match self.services().delete(id.as_str(), &DeleteParams::default()).await {
            Ok(_) => Ok(()),
            Err(kube::Error::Api(ae)) if ae.code == 404 => Ok(()),
            Err(e) => Err(map_service_error(e, id.as_str())),
        }
    }
}
