// ABOUTME: Configuration types and parsing for webdeploy.yml.
// ABOUTME: Every field has a default; lookup is --config, WEBDEPLOY_CONFIG, discovery, defaults.

mod build;
mod init;
mod node_ports;
mod visibility;

pub use build::BuildConfig;
pub use init::{generate_template_yaml, init_config};
pub use node_ports::NodePortConfig;
pub use visibility::{VisibilityConfig, VisibilityStrategy};

use crate::error::{Error, Result};
use crate::provider::RuntimeConfig;
use crate::types::BuildOrdering;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const CONFIG_FILENAME: &str = "webdeploy.yml";
pub const CONFIG_FILENAME_ALT: &str = "webdeploy.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".webdeploy/config.yml";
pub const CONFIG_ENV: &str = "WEBDEPLOY_CONFIG";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Config {
    #[serde(default = "default_namespace")]
    pub namespace: String,

    #[serde(default)]
    pub cluster: ClusterConfig,

    #[serde(default)]
    pub runtime: RuntimeConfig,

    #[serde(default)]
    pub node_ports: NodePortConfig,

    #[serde(default)]
    pub image_visibility: VisibilityConfig,

    #[serde(default)]
    pub build: BuildConfig,

    #[serde(default)]
    pub build_ordering: BuildOrdering,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ClusterConfig {
    /// API server URL; kubeconfig or in-cluster config when absent.
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Host placed in external URLs; the local hostname when absent.
    #[serde(default)]
    pub external_host: Option<String>,
}

impl ClusterConfig {
    pub fn external_host(&self) -> String {
        self.external_host
            .clone()
            .unwrap_or_else(|| gethostname::gethostname().to_string_lossy().into_owned())
    }
}

fn default_namespace() -> String {
    "default".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            cluster: ClusterConfig::default(),
            runtime: RuntimeConfig::default(),
            node_ports: NodePortConfig::default(),
            image_visibility: VisibilityConfig::default(),
            build: BuildConfig::default(),
            build_ordering: BuildOrdering::default(),
        }
    }
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        // An empty document means "all defaults".
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.exists() {
                return Self::load(path);
            }
        }

        Err(Error::ConfigNotFound(dir.to_path_buf()))
    }

    /// Explicit path, then `WEBDEPLOY_CONFIG`, then discovery in `dir`, then defaults.
    pub fn resolve(explicit: Option<&Path>, dir: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        if let Some(path) = std::env::var_os(CONFIG_ENV).filter(|p| !p.is_empty()) {
            return Self::load(&PathBuf::from(path));
        }

        match Self::discover(dir) {
            Ok(config) => Ok(config),
            Err(Error::ConfigNotFound(_)) => {
                tracing::debug!(dir = %dir.display(), "no configuration file found, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(e),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.namespace.trim().is_empty() {
            return Err(Error::InvalidConfig("namespace cannot be empty".to_string()));
        }

        self.node_ports
            .range()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;

        if self.build.command.is_empty() {
            return Err(Error::InvalidConfig(
                "build.command needs at least one element".to_string(),
            ));
        }

        if self.build.container_port == 0 {
            return Err(Error::InvalidConfig(
                "build.container_port cannot be 0".to_string(),
            ));
        }

        Ok(())
    }
}
