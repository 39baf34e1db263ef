// ABOUTME: Config scaffolding for new projects.
// ABOUTME: Writes a commented webdeploy.yml with every default spelled out.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

use super::{CONFIG_FILENAME, Config};

/// Write the template into `dir`. Refuses to overwrite unless `force`.
pub fn init_config(dir: &Path, namespace: Option<&str>, force: bool) -> Result<PathBuf> {
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() && !force {
        return Err(Error::AlreadyExists(config_path));
    }

    let mut config = Config::default();
    if let Some(ns) = namespace {
        config.namespace = ns.to_string();
        config.validate()?;
    }

    std::fs::write(&config_path, generate_template_yaml(&config))?;
    Ok(config_path)
}

pub fn generate_template_yaml(config: &Config) -> String {
    let command = config
        .build
        .command
        .iter()
        .map(|c| format!("\"{}\"", c))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        r#"# Cluster namespace for workloads and services
namespace: {}

cluster:
  # API server URL; leave unset to use kubeconfig or in-cluster config
  # endpoint: http://127.0.0.1:8080
  # Host used in public URLs; defaults to this machine's hostname
  # external_host: apps.example.com

# Container engine used for image builds (auto-detected when unset)
# runtime:
#   runtime: podman
#   socket: /run/podman/podman.sock

node_ports:
  lower: {}    # exclusive
  upper: {}    # inclusive
  # state_file: ~/.local/state/webdeploy/node_port

image_visibility:
  strategy: fixed    # fixed | poll
  max_wait: {}
  poll_interval: {}

build:
  base_image: {}
  deploy_dir: {}
  command: [{}]
  container_port: {}

build_ordering: {}    # chronological | lexicographic
"#,
        config.namespace,
        config.node_ports.lower,
        config.node_ports.upper,
        humantime_serde::re::humantime::format_duration(config.image_visibility.max_wait),
        humantime_serde::re::humantime::format_duration(config.image_visibility.poll_interval),
        config.build.base_image,
        config.build.deploy_dir,
        command,
        config.build.container_port,
        config.build_ordering,
    )
}
