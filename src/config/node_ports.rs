// ABOUTME: Node port window and the location of the persisted counter.
// ABOUTME: Converts into the allocator's range and file-backed store.

use serde::Deserialize;
use std::path::PathBuf;

use crate::ports::{FileCounterStore, NodePortRange, PortError};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NodePortConfig {
    /// Exclusive lower bound.
    #[serde(default = "default_lower")]
    pub lower: u16,

    /// Inclusive upper bound.
    #[serde(default = "default_upper")]
    pub upper: u16,

    #[serde(default)]
    pub state_file: Option<PathBuf>,
}

fn default_lower() -> u16 {
    NodePortRange::DEFAULT_LOWER
}

fn default_upper() -> u16 {
    NodePortRange::DEFAULT_UPPER
}

impl Default for NodePortConfig {
    fn default() -> Self {
        Self {
            lower: default_lower(),
            upper: default_upper(),
            state_file: None,
        }
    }
}

impl NodePortConfig {
    pub fn range(&self) -> Result<NodePortRange, PortError> {
        NodePortRange::new(self.lower, self.upper)
    }

    pub fn state_path(&self) -> PathBuf {
        self.state_file
            .clone()
            .unwrap_or_else(FileCounterStore::default_path)
    }

    pub fn store(&self) -> FileCounterStore {
        FileCounterStore::new(self.state_path())
    }
}
