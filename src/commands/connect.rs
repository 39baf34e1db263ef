// ABOUTME: Shared helper wiring configuration to concrete adapters.
// ABOUTME: Local container engine for images, Kubernetes API for workloads and services.

use webdeploy::config::Config;
use webdeploy::deploy::Orchestrator;
use webdeploy::error::Result;
use webdeploy::output::Output;
use webdeploy::ports::{FileCounterStore, NodePortAllocator};
use webdeploy::provider::{
    BollardImageBuilder, KubeServiceRegistry, KubeWorkloadController, detection, kube,
};

pub type ClusterOrchestrator =
    Orchestrator<BollardImageBuilder, KubeWorkloadController, KubeServiceRegistry, FileCounterStore>;

/// Build an orchestrator from configuration.
///
/// This handles:
/// 1. Resolving the container engine socket
/// 2. Connecting to the cluster API
/// 3. Loading the node port counter
pub async fn connect(config: &Config, output: &Output) -> Result<ClusterOrchestrator> {
    output.progress("  → Detecting container engine...");
    let engine = detection::resolve(&config.runtime)?;
    output.progress(&format!(
        "  → Found {} at {}",
        engine.runtime_type, engine.socket_path
    ));
    let images = BollardImageBuilder::connect(&engine, config.build.template())?;

    output.progress(&format!(
        "  → Connecting to cluster (namespace {})...",
        config.namespace
    ));
    let client = kube::connect(config.cluster.endpoint.as_deref()).await?;
    let port = config.build.container_port;
    let workloads = KubeWorkloadController::new(client.clone(), config.namespace.as_str(), port);
    let services = KubeServiceRegistry::new(
        client,
        config.namespace.as_str(),
        port,
        config.cluster.external_host(),
    );

    let store = config.node_ports.store();
    tracing::debug!(path = %store.path().display(), "node port state");
    let allocator = NodePortAllocator::initialize(config.node_ports.range()?, store)?;

    Ok(Orchestrator::new(images, workloads, services, allocator)
        .with_visibility(config.image_visibility.to_visibility())
        .with_ordering(config.build_ordering))
}
