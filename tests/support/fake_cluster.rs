// ABOUTME: In-memory image builder, workload controller and service registry.
// ABOUTME: Every call is journaled; any call can be made to fail by name.

use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use parking_lot::Mutex;
use webdeploy::provider::{
    BuildRequest, ImageBuilder, ImageError, ImageSummary, InstanceRecord, ServiceError,
    ServiceRecord, ServiceRegistry, ServiceSpec, WorkloadController, WorkloadError,
    WorkloadRecord, WorkloadSpec,
};
use webdeploy::types::{AppName, ComponentName, TenantName, image_reference, matches_tuple};

pub const CLUSTER_IP: &str = "10.0.0.7";
pub const CONTAINER_PORT: u16 = 8080;
pub const EXTERNAL_HOST: &str = "node1";

/// Journal plus the set of call names that should fail.
#[derive(Default)]
struct Calls {
    journal: Mutex<Vec<String>>,
    failing: Mutex<HashSet<&'static str>>,
}

impl Calls {
    fn enter(&self, call: &'static str, subject: &str) -> bool {
        self.journal.lock().push(format!("{} {}", call, subject));
        self.failing.lock().contains(call)
    }

    fn journal(&self) -> Vec<String> {
        self.journal.lock().clone()
    }

    fn fail_on(&self, call: &'static str) {
        self.failing.lock().insert(call);
    }
}

fn call_names(journal: &[String]) -> Vec<&str> {
    journal
        .iter()
        .map(|entry| entry.split(' ').next().unwrap_or_default())
        .collect()
}

// =============================================================================
// Images
// =============================================================================

#[derive(Default)]
pub struct FakeImages {
    calls: Calls,
    images: Mutex<Vec<ImageSummary>>,
}

impl FakeImages {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seed an image carrying one tag.
    pub fn with_tag(self, tag: &str) -> Self {
        self.add_tag(tag);
        self
    }

    pub fn add_tag(&self, tag: &str) {
        let mut images = self.images.lock();
        let id = format!("sha256:{:04}", images.len());
        images.push(ImageSummary {
            id,
            repo_tags: vec![tag.to_string()],
        });
    }

    pub fn tags(&self) -> Vec<String> {
        self.images
            .lock()
            .iter()
            .flat_map(|i| i.repo_tags.clone())
            .collect()
    }

    pub fn fail_on(&self, call: &'static str) {
        self.calls.fail_on(call);
    }

    pub fn journal(&self) -> Vec<String> {
        self.calls.journal()
    }

    pub fn call_count(&self, call: &str) -> usize {
        call_names(&self.journal())
            .into_iter()
            .filter(|c| *c == call)
            .count()
    }
}

#[async_trait]
impl ImageBuilder for FakeImages {
    async fn build_image(&self, request: &BuildRequest) -> Result<String, ImageError> {
        let reference = image_reference(&request.tenant, &request.app, &request.version);
        if self.calls.enter("build_image", &reference) {
            return Err(ImageError::BuildFailed {
                reference,
                message: "boom".to_string(),
            });
        }
        self.add_tag(&reference);
        Ok(reference)
    }

    async fn existing_images(
        &self,
        tenant: &TenantName,
        app: &AppName,
        version: &str,
    ) -> Result<Vec<ImageSummary>, ImageError> {
        let subject = format!("{}/{}:{}", tenant, app, version);
        if self.calls.enter("existing_images", &subject) {
            return Err(ImageError::Runtime("boom".to_string()));
        }
        Ok(self
            .images
            .lock()
            .iter()
            .filter(|i| {
                i.repo_tags
                    .iter()
                    .any(|t| matches_tuple(t, tenant, app, version))
            })
            .cloned()
            .collect())
    }

    async fn image_exists(&self, reference: &str) -> Result<bool, ImageError> {
        if self.calls.enter("image_exists", reference) {
            return Err(ImageError::Runtime("boom".to_string()));
        }
        Ok(self.tags().iter().any(|t| t == reference))
    }

    async fn remove_image(
        &self,
        tenant: &TenantName,
        app: &AppName,
        version: &str,
    ) -> Result<String, ImageError> {
        let reference = image_reference(tenant, app, version);
        if self.calls.enter("remove_image", &reference) {
            return Err(ImageError::InUse(reference));
        }
        let mut images = self.images.lock();
        let before = images.len();
        images.retain(|i| !i.repo_tags.contains(&reference));
        if images.len() == before {
            return Err(ImageError::NotFound(reference));
        }
        Ok(reference)
    }
}

// =============================================================================
// Workloads
// =============================================================================

#[derive(Default)]
pub struct FakeWorkloads {
    calls: Calls,
    workloads: Mutex<BTreeMap<String, WorkloadRecord>>,
    /// (selector label, instance)
    instances: Mutex<Vec<(String, InstanceRecord)>>,
    next_instance: Mutex<u32>,
}

impl FakeWorkloads {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seed a live workload with `replicas` running instances.
    pub fn with_workload(self, name: &str, image: &str, replicas: u32) -> Self {
        self.workloads.lock().insert(
            name.to_string(),
            WorkloadRecord {
                name: name.to_string(),
                image: image.to_string(),
                replicas,
            },
        );
        for _ in 0..replicas {
            self.spawn(name, image);
        }
        self
    }

    fn spawn(&self, label: &str, image: &str) {
        let mut counter = self.next_instance.lock();
        *counter += 1;
        self.instances.lock().push((
            label.to_string(),
            InstanceRecord {
                name: format!("{}-{}", label, counter),
                image: image.to_string(),
            },
        ));
    }

    pub fn workload(&self, name: &str) -> Option<WorkloadRecord> {
        self.workloads.lock().get(name).cloned()
    }

    pub fn instances(&self, label: &str) -> Vec<InstanceRecord> {
        self.instances
            .lock()
            .iter()
            .filter(|(l, _)| l == label)
            .map(|(_, i)| i.clone())
            .collect()
    }

    pub fn fail_on(&self, call: &'static str) {
        self.calls.fail_on(call);
    }

    pub fn journal(&self) -> Vec<String> {
        self.calls.journal()
    }

    /// Calls other than lookups.
    pub fn mutating_calls(&self) -> Vec<String> {
        self.journal()
            .into_iter()
            .filter(|c| !c.starts_with("get ") && !c.starts_with("list_instances "))
            .collect()
    }
}

#[async_trait]
impl WorkloadController for FakeWorkloads {
    async fn create(&self, spec: &WorkloadSpec) -> Result<(), WorkloadError> {
        if self.calls.enter("create", spec.name.as_str()) {
            return Err(WorkloadError::Runtime("boom".to_string()));
        }
        let mut workloads = self.workloads.lock();
        if workloads.contains_key(spec.name.as_str()) {
            return Err(WorkloadError::AlreadyExists(spec.name.to_string()));
        }
        workloads.insert(
            spec.name.to_string(),
            WorkloadRecord {
                name: spec.name.to_string(),
                image: spec.image.clone(),
                replicas: spec.replicas,
            },
        );
        drop(workloads);
        for _ in 0..spec.replicas {
            self.spawn(&spec.label, &spec.image);
        }
        Ok(())
    }

    async fn get(&self, name: &ComponentName) -> Result<Option<WorkloadRecord>, WorkloadError> {
        if self.calls.enter("get", name.as_str()) {
            return Err(WorkloadError::Runtime("boom".to_string()));
        }
        Ok(self.workload(name.as_str()))
    }

    async fn update_replica_count(
        &self,
        name: &ComponentName,
        replicas: u32,
    ) -> Result<(), WorkloadError> {
        if self
            .calls
            .enter("update_replica_count", &format!("{} {}", name, replicas))
        {
            return Err(WorkloadError::Runtime("boom".to_string()));
        }
        let mut workloads = self.workloads.lock();
        let workload = workloads
            .get_mut(name.as_str())
            .ok_or_else(|| WorkloadError::NotFound(name.to_string()))?;
        workload.replicas = replicas;
        Ok(())
    }

    async fn update_image(&self, name: &ComponentName, image: &str) -> Result<(), WorkloadError> {
        if self
            .calls
            .enter("update_image", &format!("{} {}", name, image))
        {
            return Err(WorkloadError::Runtime("boom".to_string()));
        }
        // Like a replication controller: running instances keep their image.
        let mut workloads = self.workloads.lock();
        let workload = workloads
            .get_mut(name.as_str())
            .ok_or_else(|| WorkloadError::NotFound(name.to_string()))?;
        workload.image = image.to_string();
        Ok(())
    }

    async fn delete(&self, name: &ComponentName) -> Result<(), WorkloadError> {
        if self.calls.enter("delete", name.as_str()) {
            return Err(WorkloadError::Runtime("boom".to_string()));
        }
        self.workloads
            .lock()
            .remove(name.as_str())
            .map(|_| ())
            .ok_or_else(|| WorkloadError::NotFound(name.to_string()))
    }

    async fn delete_instances_matching_label(
        &self,
        name: &ComponentName,
    ) -> Result<(), WorkloadError> {
        if self
            .calls
            .enter("delete_instances_matching_label", name.as_str())
        {
            return Err(WorkloadError::Runtime("boom".to_string()));
        }
        self.instances.lock().retain(|(l, _)| l != name.as_str());
        Ok(())
    }

    async fn list_instances(
        &self,
        name: &ComponentName,
    ) -> Result<Vec<InstanceRecord>, WorkloadError> {
        if self.calls.enter("list_instances", name.as_str()) {
            return Err(WorkloadError::Runtime("boom".to_string()));
        }
        Ok(self.instances(name.as_str()))
    }

    async fn delete_instance(&self, instance: &str) -> Result<(), WorkloadError> {
        if self.calls.enter("delete_instance", instance) {
            return Err(WorkloadError::Runtime("boom".to_string()));
        }
        self.instances.lock().retain(|(_, i)| i.name != instance);
        Ok(())
    }
}

// =============================================================================
// Services
// =============================================================================

#[derive(Default)]
pub struct FakeServices {
    calls: Calls,
    services: Mutex<BTreeMap<String, ServiceRecord>>,
}

impl FakeServices {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_service(self, id: &str, node_port: u16) -> Self {
        self.services.lock().insert(
            id.to_string(),
            ServiceRecord {
                id: id.to_string(),
                cluster_ip: Some(CLUSTER_IP.to_string()),
                node_port: Some(node_port),
            },
        );
        self
    }

    pub fn service(&self, id: &str) -> Option<ServiceRecord> {
        self.services.lock().get(id).cloned()
    }

    pub fn fail_on(&self, call: &'static str) {
        self.calls.fail_on(call);
    }

    pub fn journal(&self) -> Vec<String> {
        self.calls.journal()
    }

    pub fn mutating_calls(&self) -> Vec<String> {
        self.journal()
            .into_iter()
            .filter(|c| c.starts_with("create ") || c.starts_with("delete "))
            .collect()
    }
}

#[async_trait]
impl ServiceRegistry for FakeServices {
    async fn create(&self, spec: &ServiceSpec) -> Result<(), ServiceError> {
        if self
            .calls
            .enter("create", &format!("{} {}", spec.id, spec.node_port))
        {
            return Err(ServiceError::PortUnavailable(spec.node_port.to_string()));
        }
        let mut services = self.services.lock();
        if services.contains_key(spec.id.as_str()) {
            return Err(ServiceError::AlreadyExists(spec.id.to_string()));
        }
        services.insert(
            spec.id.to_string(),
            ServiceRecord {
                id: spec.id.to_string(),
                cluster_ip: Some(CLUSTER_IP.to_string()),
                node_port: Some(spec.node_port),
            },
        );
        Ok(())
    }

    async fn get(&self, id: &ComponentName) -> Result<Option<ServiceRecord>, ServiceError> {
        if self.calls.enter("get", id.as_str()) {
            return Err(ServiceError::Runtime("boom".to_string()));
        }
        Ok(self.service(id.as_str()))
    }

    async fn cluster_address(&self, id: &ComponentName) -> Result<Option<String>, ServiceError> {
        if self.calls.enter("cluster_address", id.as_str()) {
            return Err(ServiceError::Runtime("boom".to_string()));
        }
        Ok(self
            .service(id.as_str())
            .and_then(|s| s.cluster_ip)
            .map(|ip| format!("{}:{}", ip, CONTAINER_PORT)))
    }

    async fn external_address(&self, id: &ComponentName) -> Result<Option<String>, ServiceError> {
        if self.calls.enter("external_address", id.as_str()) {
            return Err(ServiceError::Runtime("boom".to_string()));
        }
        Ok(self
            .service(id.as_str())
            .and_then(|s| s.node_port)
            .map(|port| format!("{}:{}", EXTERNAL_HOST, port)))
    }

    async fn delete(&self, id: &ComponentName) -> Result<(), ServiceError> {
        if self.calls.enter("delete", id.as_str()) {
            return Err(ServiceError::Runtime("boom".to_string()));
        }
        self.services.lock().remove(id.as_str());
        Ok(())
    }
}
