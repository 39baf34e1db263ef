// ABOUTME: Deploy sequence state types for the type state pattern.
// ABOUTME: Each state carries what the previous steps produced.

/// Nothing created yet.
/// Available actions: `build_image()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Planned;

/// Image build accepted by the builder.
/// Available actions: `await_visible()`
#[derive(Debug, Clone)]
pub struct ImageBuilt {
    pub(crate) image: String,
}

/// Image assumed or confirmed resolvable by the cluster.
/// Available actions: `create_workload()`
#[derive(Debug, Clone)]
pub struct ImageVisible {
    pub(crate) image: String,
    pub(crate) confirmed: bool,
}

/// Workload created with the new image.
/// Available actions: `expose()`
#[derive(Debug, Clone)]
pub struct WorkloadCreated {
    pub(crate) image: String,
}

/// Service in place. `node_port` is `None` when an existing service was kept.
/// Available actions: `finish()`
#[derive(Debug, Clone)]
pub struct Exposed {
    pub(crate) image: String,
    pub(crate) node_port: Option<u16>,
}
