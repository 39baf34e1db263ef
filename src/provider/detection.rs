// ABOUTME: Locates the local container engine socket used for image builds.
// ABOUTME: Explicit configuration wins; otherwise Podman sockets are checked before Docker.

use serde::{Deserialize, Serialize};
use std::path::Path;

const ROOTFUL_PODMAN: &str = "/run/podman/podman.sock";
const DOCKER_SOCKET: &str = "/var/run/docker.sock";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeType {
    Docker,
    Podman,
}

impl std::fmt::Display for RuntimeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuntimeType::Docker => write!(f, "docker"),
            RuntimeType::Podman => write!(f, "podman"),
        }
    }
}

/// Engine chosen for image builds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeInfo {
    pub runtime_type: RuntimeType,
    pub socket_path: String,
}

/// Explicit engine override from the configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default)]
    pub runtime: Option<RuntimeType>,
    #[serde(default)]
    pub socket: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum DetectionError {
    #[error("no container engine found (checked Podman and Docker sockets)")]
    NoRuntimeFound,

    #[error("failed to connect to container engine at {socket}: {message}")]
    ConnectionFailed { socket: String, message: String },
}

/// Resolve the engine from configuration, falling back to [`detect_local`].
pub fn resolve(config: &RuntimeConfig) -> Result<RuntimeInfo, DetectionError> {
    match (config.runtime, &config.socket) {
        (Some(runtime_type), socket) => Ok(RuntimeInfo {
            runtime_type,
            socket_path: socket
                .clone()
                .unwrap_or_else(|| default_socket_path(runtime_type).to_string()),
        }),
        // A socket without a type is assumed to speak the Docker API.
        (None, Some(socket)) => Ok(RuntimeInfo {
            runtime_type: RuntimeType::Docker,
            socket_path: socket.clone(),
        }),
        (None, None) => detect_local(),
    }
}

/// Detection order:
/// 1. Rootless Podman socket (`/run/user/$UID/podman/podman.sock`)
/// 2. Rootful Podman socket (`/run/podman/podman.sock`)
/// 3. Docker socket (`/var/run/docker.sock`)
pub fn detect_local() -> Result<RuntimeInfo, DetectionError> {
    if let Some(uid) = current_uid() {
        let rootless = format!("/run/user/{}/podman/podman.sock", uid);
        if Path::new(&rootless).exists() {
            return Ok(RuntimeInfo {
                runtime_type: RuntimeType::Podman,
                socket_path: rootless,
            });
        }
    }

    if Path::new(ROOTFUL_PODMAN).exists() {
        return Ok(RuntimeInfo {
            runtime_type: RuntimeType::Podman,
            socket_path: ROOTFUL_PODMAN.to_string(),
        });
    }

    if Path::new(DOCKER_SOCKET).exists() {
        return Ok(RuntimeInfo {
            runtime_type: RuntimeType::Docker,
            socket_path: DOCKER_SOCKET.to_string(),
        });
    }

    Err(DetectionError::NoRuntimeFound)
}

fn current_uid() -> Option<String> {
    std::env::var("UID").ok().or_else(|| {
        std::fs::read_to_string("/proc/self/status")
            .ok()
            .and_then(|status| {
                status
                    .lines()
                    .find(|l| l.starts_with("Uid:"))
                    .and_then(|l| l.split_whitespace().nth(1))
                    .map(|s| s.to_string())
            })
    })
}

fn default_socket_path(runtime: RuntimeType) -> &'static str {
    match runtime {
        RuntimeType::Docker => DOCKER_SOCKET,
        RuntimeType::Podman => ROOTFUL_PODMAN,
    }
}
