// ABOUTME: Lifecycle operations for one tenant application: deploy, update, rollback, scale, remove.
// ABOUTME: Reads live provider state on every call, acts on it, and accepts the race window.

use chrono::NaiveDateTime;
use snafu::{ResultExt, ensure};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::ports::{CounterStore, NodePortAllocator};
use crate::provider::{BuildRequest, ImageBuilder, ServiceRegistry, WorkloadController};
use crate::types::{
    AppName, BuildId, BuildOrdering, ComponentName, TenantName, make_version_tag, matches_tuple,
};

use super::deployment::{DeployOutcome, DeployPlan, Deployment};
use super::error::{ForeignBuildSnafu, InvalidBuildIdSnafu, InvalidNameSnafu, OrchestratorError};
use super::steps::{Operation, Step, StepLog};
use super::visibility::ImageVisibility;

/// Source of build timestamps.
pub type Clock = Box<dyn Fn() -> NaiveDateTime + Send + Sync>;

fn local_clock() -> Clock {
    Box::new(|| chrono::Local::now().naive_local())
}

/// Which side of the live build a listing returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Higher,
    Lower,
}

/// Composes the image builder, workload controller, service registry and
/// node port allocator. One instance must own a component at a time; two
/// orchestrators acting on the same component or counter can interleave.
pub struct Orchestrator<I, W, S, C> {
    images: I,
    workloads: W,
    services: S,
    ports: NodePortAllocator<C>,
    visibility: ImageVisibility,
    ordering: BuildOrdering,
    clock: Clock,
}

impl<I, W, S, C> Orchestrator<I, W, S, C>
where
    I: ImageBuilder,
    W: WorkloadController,
    S: ServiceRegistry,
    C: CounterStore,
{
    pub fn new(images: I, workloads: W, services: S, ports: NodePortAllocator<C>) -> Self {
        Self {
            images,
            workloads,
            services,
            ports,
            visibility: ImageVisibility::default(),
            ordering: BuildOrdering::default(),
            clock: local_clock(),
        }
    }

    pub fn with_visibility(mut self, visibility: ImageVisibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn with_ordering(mut self, ordering: BuildOrdering) -> Self {
        self.ordering = ordering;
        self
    }

    pub fn with_clock(mut self, clock: impl Fn() -> NaiveDateTime + Send + Sync + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn images(&self) -> &I {
        &self.images
    }

    pub fn workloads(&self) -> &W {
        &self.workloads
    }

    pub fn services(&self) -> &S {
        &self.services
    }

    pub fn ports(&self) -> &NodePortAllocator<C> {
        &self.ports
    }

    pub fn ordering(&self) -> BuildOrdering {
        self.ordering
    }

    fn component(tenant: &TenantName, app: &AppName) -> Result<ComponentName, OrchestratorError> {
        ComponentName::derive(tenant, app).context(InvalidNameSnafu)
    }

    /// Stamp the user version with the current date and time. An empty
    /// version is stamped too, so every build gets a distinct tag.
    fn stamp(&self, version: &str) -> String {
        make_version_tag(version, (self.clock)())
    }

    fn parse_owned_build(
        tenant: &TenantName,
        app: &AppName,
        build: &str,
    ) -> Result<BuildId, OrchestratorError> {
        let id = BuildId::parse(build).context(InvalidBuildIdSnafu)?;
        let repository = format!("{}/{}", tenant, app);
        ensure!(
            id.repository() == repository,
            ForeignBuildSnafu {
                build: build.to_string(),
                repository,
            }
        );
        Ok(id)
    }

    // =========================================================================
    // Lifecycle operations
    // =========================================================================

    /// First-time deployment. `Ok(false)` if a build for this version already exists.
    pub async fn deploy(
        &self,
        tenant: &TenantName,
        app: &AppName,
        artifact: &Path,
        version: &str,
        replicas: u32,
    ) -> Result<bool, OrchestratorError> {
        Ok(self
            .deploy_with_outcome(tenant, app, artifact, version, replicas)
            .await?
            .is_some())
    }

    /// Like [`deploy`](Self::deploy), reporting the image and node port on success.
    pub async fn deploy_with_outcome(
        &self,
        tenant: &TenantName,
        app: &AppName,
        artifact: &Path,
        version: &str,
        replicas: u32,
    ) -> Result<Option<DeployOutcome>, OrchestratorError> {
        let component = Self::component(tenant, app)?;
        let mut log = StepLog::new(Operation::Deploy, &component);

        let existing = log.track(
            Step::QueryImages,
            self.images.existing_images(tenant, app, version).await,
        )?;
        if !existing.is_empty() {
            info!(component = %component, version, "build already exists, use a rolling update");
            return Ok(None);
        }

        let plan = DeployPlan {
            tenant: tenant.clone(),
            app: app.clone(),
            component,
            artifact: artifact.to_path_buf(),
            version: self.stamp(version),
            replicas,
        };

        let outcome = Deployment::new(plan, log)
            .build_image(&self.images)
            .await?
            .await_visible(&self.images, &self.visibility)
            .await
            .create_workload(&self.workloads)
            .await?
            .expose(&self.services, &self.ports)
            .await?
            .finish();

        info!(
            component = %outcome.component,
            image = %outcome.image,
            replicas,
            node_port = ?outcome.node_port,
            "deployed"
        );
        Ok(Some(outcome))
    }

    /// Build a new image for a live application and switch the workload to it.
    /// `Ok(false)` without side effects if no build of the version exists or
    /// nothing is deployed.
    pub async fn roll_update(
        &self,
        tenant: &TenantName,
        app: &AppName,
        version: &str,
        artifact: &Path,
    ) -> Result<bool, OrchestratorError> {
        let component = Self::component(tenant, app)?;
        let mut log = StepLog::new(Operation::RollUpdate, &component);

        let existing = log.track(
            Step::QueryImages,
            self.images.existing_images(tenant, app, version).await,
        )?;
        if existing.is_empty() {
            info!(component = %component, version, "no existing build, nothing to update");
            return Ok(false);
        }

        let workload = log.track(Step::LookupWorkload, self.workloads.get(&component).await)?;
        if workload.is_none() {
            info!(component = %component, "no workload deployed, nothing to update");
            return Ok(false);
        }

        let request = BuildRequest {
            tenant: tenant.clone(),
            app: app.clone(),
            version: self.stamp(version),
            artifact: artifact.to_path_buf(),
        };
        let image = log.track(Step::BuildImage, self.images.build_image(&request).await)?;

        self.visibility.await_visible(&self.images, &image).await;
        log.record(Step::AwaitImage);

        self.switch_image(&mut log, &component, &image).await?;
        info!(component = %component, image = %image, "rolling update applied");
        Ok(true)
    }

    /// Point the workload at a previously built image. No image is built.
    pub async fn roll_back(
        &self,
        tenant: &TenantName,
        app: &AppName,
        version: &str,
        build: &str,
    ) -> Result<bool, OrchestratorError> {
        let component = Self::component(tenant, app)?;
        let target = Self::parse_owned_build(tenant, app, build)?;
        let mut log = StepLog::new(Operation::RollBack, &component);

        let existing = log.track(
            Step::QueryImages,
            self.images.existing_images(tenant, app, version).await,
        )?;
        if existing.is_empty() {
            info!(component = %component, version, "no existing build, nothing to roll back");
            return Ok(false);
        }

        let workload = log.track(Step::LookupWorkload, self.workloads.get(&component).await)?;
        if workload.is_none() {
            info!(component = %component, "no workload deployed, nothing to roll back");
            return Ok(false);
        }

        self.switch_image(&mut log, &component, target.as_str())
            .await?;
        info!(component = %component, image = %target, "rolled back");
        Ok(true)
    }

    /// Mutate the desired image, then delete instances still running another image.
    async fn switch_image(
        &self,
        log: &mut StepLog,
        component: &ComponentName,
        image: &str,
    ) -> Result<(), OrchestratorError> {
        log.track(
            Step::UpdateImage,
            self.workloads.update_image(component, image).await,
        )?;

        let instances = log.track(
            Step::ListInstances,
            self.workloads.list_instances(component).await,
        )?;
        for instance in instances.iter().filter(|i| i.image != image) {
            debug!(component = %component, instance = %instance.name, image = %instance.image, "pruning instance");
            log.track(
                Step::PruneInstances,
                self.workloads.delete_instance(&instance.name).await,
            )?;
        }
        Ok(())
    }

    /// Change the desired replica count of a live workload.
    /// An unchanged count succeeds without writing.
    pub async fn scale(
        &self,
        tenant: &TenantName,
        app: &AppName,
        replicas: u32,
    ) -> Result<bool, OrchestratorError> {
        let component = Self::component(tenant, app)?;
        let mut log = StepLog::new(Operation::Scale, &component);

        let Some(workload) =
            log.track(Step::LookupWorkload, self.workloads.get(&component).await)?
        else {
            info!(component = %component, "no workload deployed, nothing to scale");
            return Ok(false);
        };

        if workload.replicas == replicas {
            debug!(component = %component, replicas, "replica count unchanged");
            return Ok(true);
        }

        log.track(
            Step::ScaleReplicas,
            self.workloads
                .update_replica_count(&component, replicas)
                .await,
        )?;
        info!(component = %component, from = workload.replicas, replicas, "scaled");
        Ok(true)
    }

    /// Drain to zero, delete the workload, its leftover instances and the service.
    /// Images are kept; see [`purge_image`](Self::purge_image).
    pub async fn remove(&self, tenant: &TenantName, app: &AppName) -> Result<bool, OrchestratorError> {
        let component = Self::component(tenant, app)?;
        let mut log = StepLog::new(Operation::Remove, &component);

        let Some(workload) =
            log.track(Step::LookupWorkload, self.workloads.get(&component).await)?
        else {
            info!(component = %component, "no workload deployed, nothing to remove");
            return Ok(false);
        };

        if workload.replicas != 0 {
            log.track(
                Step::ScaleReplicas,
                self.workloads.update_replica_count(&component, 0).await,
            )?;
        }
        log.track(Step::DeleteWorkload, self.workloads.delete(&component).await)?;
        log.track(
            Step::DeleteInstances,
            self.workloads
                .delete_instances_matching_label(&component)
                .await,
        )?;
        log.track(Step::DeleteService, self.services.delete(&component).await)?;

        info!(component = %component, "removed");
        Ok(true)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    async fn existing_builds(
        &self,
        log: &mut StepLog,
        tenant: &TenantName,
        app: &AppName,
        version: &str,
    ) -> Result<Vec<BuildId>, OrchestratorError> {
        let images = log.track(
            Step::QueryImages,
            self.images.existing_images(tenant, app, version).await,
        )?;

        let tags: BTreeSet<&str> = images
            .iter()
            .flat_map(|image| image.repo_tags.iter())
            .map(String::as_str)
            .filter(|tag| matches_tuple(tag, tenant, app, version))
            .collect();

        let mut builds: Vec<BuildId> = tags
            .into_iter()
            .filter_map(|tag| match BuildId::parse(tag) {
                Ok(id) => Some(id),
                Err(e) => {
                    warn!(tag, error = %e, "skipping unparseable build tag");
                    None
                }
            })
            .collect();
        self.ordering.sort(&mut builds);
        Ok(builds)
    }

    /// Every build of `tenant/app:version*`, ascending.
    pub async fn list_existing_builds(
        &self,
        tenant: &TenantName,
        app: &AppName,
        version: &str,
    ) -> Result<Vec<String>, OrchestratorError> {
        let component = Self::component(tenant, app)?;
        let mut log = StepLog::new(Operation::ListBuilds, &component);
        let builds = self.existing_builds(&mut log, tenant, app, version).await?;
        Ok(builds.into_iter().map(|b| b.to_string()).collect())
    }

    /// Builds ordered after the image the live workload runs.
    pub async fn list_higher_builds(
        &self,
        tenant: &TenantName,
        app: &AppName,
        version: &str,
    ) -> Result<Vec<String>, OrchestratorError> {
        self.list_relative(tenant, app, version, Side::Higher).await
    }

    /// Builds ordered before the image the live workload runs; rollback candidates.
    pub async fn list_lower_builds(
        &self,
        tenant: &TenantName,
        app: &AppName,
        version: &str,
    ) -> Result<Vec<String>, OrchestratorError> {
        self.list_relative(tenant, app, version, Side::Lower).await
    }

    async fn list_relative(
        &self,
        tenant: &TenantName,
        app: &AppName,
        version: &str,
        side: Side,
    ) -> Result<Vec<String>, OrchestratorError> {
        let component = Self::component(tenant, app)?;
        let mut log = StepLog::new(Operation::ListBuilds, &component);

        let Some(workload) =
            log.track(Step::LookupWorkload, self.workloads.get(&component).await)?
        else {
            debug!(component = %component, "no workload deployed, no relative builds");
            return Ok(Vec::new());
        };

        let current = match BuildId::parse(&workload.image) {
            Ok(current) => current,
            Err(e) => {
                warn!(component = %component, image = %workload.image, error = %e, "live image is not a build identifier");
                return Ok(Vec::new());
            }
        };

        let wanted = match side {
            Side::Higher => std::cmp::Ordering::Greater,
            Side::Lower => std::cmp::Ordering::Less,
        };

        let builds = self.existing_builds(&mut log, tenant, app, version).await?;
        Ok(builds
            .into_iter()
            .filter(|b| self.ordering.compare(b, &current) == wanted)
            .map(|b| b.to_string())
            .collect())
    }

    /// Desired replica count of the live workload, `0` when none exists.
    pub async fn replica_count(
        &self,
        tenant: &TenantName,
        app: &AppName,
    ) -> Result<u32, OrchestratorError> {
        let component = Self::component(tenant, app)?;
        let mut log = StepLog::new(Operation::ReplicaCount, &component);
        let workload = log.track(Step::LookupWorkload, self.workloads.get(&component).await)?;
        Ok(workload.map(|w| w.replicas).unwrap_or(0))
    }

    /// Cluster and public URLs of the application, one per line.
    pub async fn service_access_summary(
        &self,
        tenant: &TenantName,
        app: &AppName,
        artifact: &Path,
    ) -> Result<String, OrchestratorError> {
        let component = Self::component(tenant, app)?;
        let mut log = StepLog::new(Operation::AccessSummary, &component);
        let name = artifact_name(artifact);

        let cluster = log.track(
            Step::LookupService,
            self.services.cluster_address(&component).await,
        )?;
        let external = log.track(
            Step::LookupService,
            self.services.external_address(&component).await,
        )?;

        let cluster = cluster
            .map(|address| format!("http://{}/{}", address, name))
            .unwrap_or_else(|| "ClusterIP not available.".to_string());
        let external = external
            .map(|address| format!("http://{}/{}", address, name))
            .unwrap_or_else(|| "NodePortIP not available.".to_string());

        Ok(format!("Cluster IP: {}\nPublic IP: {}\n\n", cluster, external))
    }

    /// Remove one built image. Never part of [`remove`](Self::remove).
    pub async fn purge_image(
        &self,
        tenant: &TenantName,
        app: &AppName,
        build: &str,
    ) -> Result<String, OrchestratorError> {
        let component = Self::component(tenant, app)?;
        let target = Self::parse_owned_build(tenant, app, build)?;
        let mut log = StepLog::new(Operation::PurgeImage, &component);

        let removed = log.track(
            Step::RemoveImage,
            self.images.remove_image(tenant, app, target.tag()).await,
        )?;
        info!(component = %component, image = %removed, "image removed");
        Ok(removed)
    }
}

/// Artifact file name without its extension (`shop.war` -> `shop`).
pub fn artifact_name(artifact: &Path) -> String {
    artifact
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}
