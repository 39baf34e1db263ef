// ABOUTME: Node port allocation for services exposed outside the cluster.
// ABOUTME: A persisted counter cycling through a reserved port window.

mod allocator;
mod store;

pub use allocator::{NodePortAllocator, NodePortRange};
pub use store::{CounterStore, FileCounterStore, MemoryCounterStore};

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("failed to access port state at {path}: {message}")]
    Io { path: String, message: String },

    #[error("port state is not a port number: {0}")]
    Malformed(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PortError {
    #[error("invalid node port range: lower {lower} must be below upper {upper}")]
    InvalidRange { lower: u16, upper: u16 },

    #[error(transparent)]
    Store(#[from] StoreError),
}
