// ABOUTME: State transition methods for the deploy sequence.
// ABOUTME: Each method consumes self and returns the next state; failures keep earlier resources.

use snafu::ResultExt;
use tracing::{debug, info};

use crate::ports::{CounterStore, NodePortAllocator};
use crate::provider::{
    BuildRequest, ImageBuilder, ServiceRegistry, ServiceSpec, WorkloadController, WorkloadSpec,
};

use super::Deployment;
use super::error::{OrchestratorError, PortAllocationSnafu};
use super::state::{Exposed, ImageBuilt, ImageVisible, Planned, WorkloadCreated};
use super::steps::Step;
use super::visibility::ImageVisibility;

impl<S> Deployment<S> {
    fn transition<T>(self, state: T) -> Deployment<T> {
        Deployment {
            plan: self.plan,
            log: self.log,
            state,
        }
    }
}

impl Deployment<Planned> {
    /// Planned -> ImageBuilt
    pub async fn build_image<I>(
        mut self,
        images: &I,
    ) -> Result<Deployment<ImageBuilt>, OrchestratorError>
    where
        I: ImageBuilder + ?Sized,
    {
        let request = BuildRequest {
            tenant: self.plan.tenant.clone(),
            app: self.plan.app.clone(),
            version: self.plan.version.clone(),
            artifact: self.plan.artifact.clone(),
        };

        debug!(component = %self.plan.component, artifact = %request.artifact.display(), "building image");
        let image = self
            .log
            .track(Step::BuildImage, images.build_image(&request).await)?;
        info!(component = %self.plan.component, image = %image, "image built");

        Ok(self.transition(ImageBuilt { image }))
    }
}

impl Deployment<ImageBuilt> {
    /// ImageBuilt -> ImageVisible. Never fails; a timeout only logs.
    pub async fn await_visible<I>(
        mut self,
        images: &I,
        visibility: &ImageVisibility,
    ) -> Deployment<ImageVisible>
    where
        I: ImageBuilder + ?Sized,
    {
        let confirmed = visibility.await_visible(images, &self.state.image).await;
        self.log.record(Step::AwaitImage);
        let image = self.state.image.clone();
        self.transition(ImageVisible { image, confirmed })
    }
}

impl Deployment<ImageVisible> {
    /// ImageVisible -> WorkloadCreated
    pub async fn create_workload<W>(
        mut self,
        workloads: &W,
    ) -> Result<Deployment<WorkloadCreated>, OrchestratorError>
    where
        W: WorkloadController + ?Sized,
    {
        let spec = WorkloadSpec {
            name: self.plan.component.clone(),
            label: self.plan.component.to_string(),
            image: self.state.image.clone(),
            replicas: self.plan.replicas,
        };

        debug!(component = %spec.name, image = %spec.image, replicas = spec.replicas, "creating workload");
        self.log
            .track(Step::CreateWorkload, workloads.create(&spec).await)?;

        let image = self.state.image.clone();
        Ok(self.transition(WorkloadCreated { image }))
    }
}

impl Deployment<WorkloadCreated> {
    /// WorkloadCreated -> Exposed
    ///
    /// An existing service is kept and no port is allocated. Otherwise the
    /// next node port is taken before the service is created, so a failed
    /// creation permanently skips that port.
    pub async fn expose<R, C>(
        mut self,
        services: &R,
        ports: &NodePortAllocator<C>,
    ) -> Result<Deployment<Exposed>, OrchestratorError>
    where
        R: ServiceRegistry + ?Sized,
        C: CounterStore,
    {
        let component = self.plan.component.clone();
        let existing = self
            .log
            .track(Step::LookupService, services.get(&component).await)?;

        if existing.is_some() {
            info!(component = %component, "service already exists, keeping it");
            let image = self.state.image.clone();
            return Ok(self.transition(Exposed {
                image,
                node_port: None,
            }));
        }

        let node_port = ports.allocate().context(PortAllocationSnafu {
            operation: self.log.operation(),
            component: component.to_string(),
            completed: self.log.completed().to_vec(),
        })?;
        self.log.record(Step::AllocatePort);

        let spec = ServiceSpec {
            id: component.clone(),
            name: component.to_string(),
            node_port,
        };
        debug!(component = %component, node_port, "creating service");
        self.log
            .track(Step::CreateService, services.create(&spec).await)?;

        let image = self.state.image.clone();
        Ok(self.transition(Exposed {
            image,
            node_port: Some(node_port),
        }))
    }
}
