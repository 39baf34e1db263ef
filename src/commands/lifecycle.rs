// ABOUTME: Deploy, update, rollback, scale, remove and purge-image commands.
// ABOUTME: A lifecycle call that does not apply to the live state exits with an error.

use std::path::Path;

use super::connect::ClusterOrchestrator;
use webdeploy::error::{Error, Result};
use webdeploy::output::Output;
use webdeploy::types::{AppName, TenantName};

fn ensure_artifact(artifact: &Path) -> Result<()> {
    if artifact.is_file() {
        return Ok(());
    }
    Err(Error::Io(std::io::Error::new(
        std::io::ErrorKind::NotFound,
        format!("artifact not found: {}", artifact.display()),
    )))
}

pub async fn deploy(
    orchestrator: &ClusterOrchestrator,
    tenant: &TenantName,
    app: &AppName,
    artifact: &Path,
    version: &str,
    replicas: u32,
    output: &Output,
) -> Result<()> {
    ensure_artifact(artifact)?;
    output.progress(&format!(
        "Deploying {}/{} version {} with {} replica(s)",
        tenant, app, version, replicas
    ));

    let Some(outcome) = orchestrator
        .deploy_with_outcome(tenant, app, artifact, version, replicas)
        .await?
    else {
        return Err(Error::NotApplicable(format!(
            "{}/{}:{} is already deployed; use `webdeploy update` to roll out a new build",
            tenant, app, version
        )));
    };

    output.progress(&format!("  → Image {}", outcome.image));
    match outcome.node_port {
        Some(port) => output.progress(&format!("  → Exposed on node port {}", port)),
        None => output.progress("  → Kept existing service"),
    }
    output.success(&format!("Deployed {}", outcome.component));
    Ok(())
}

pub async fn update(
    orchestrator: &ClusterOrchestrator,
    tenant: &TenantName,
    app: &AppName,
    artifact: &Path,
    version: &str,
    output: &Output,
) -> Result<()> {
    ensure_artifact(artifact)?;
    output.progress(&format!("Updating {}/{} version {}", tenant, app, version));

    if !orchestrator.roll_update(tenant, app, version, artifact).await? {
        return Err(Error::NotApplicable(format!(
            "{}/{}:{} is not deployed; use `webdeploy deploy` first",
            tenant, app, version
        )));
    }

    output.success(&format!("Updated {}-{}", app, tenant));
    Ok(())
}

pub async fn rollback(
    orchestrator: &ClusterOrchestrator,
    tenant: &TenantName,
    app: &AppName,
    version: &str,
    build: Option<String>,
    output: &Output,
) -> Result<()> {
    let build = match build {
        Some(build) => build,
        None => {
            // Lower builds are sorted ascending; the last is the newest earlier one.
            let lower = orchestrator.list_lower_builds(tenant, app, version).await?;
            lower.last().cloned().ok_or_else(|| {
                Error::NotApplicable(format!(
                    "no earlier build of {}/{}:{} to roll back to",
                    tenant, app, version
                ))
            })?
        }
    };

    output.progress(&format!("Rolling back {}/{} to {}", tenant, app, build));
    if !orchestrator.roll_back(tenant, app, version, &build).await? {
        return Err(Error::NotApplicable(format!(
            "{}/{}:{} is not deployed",
            tenant, app, version
        )));
    }

    output.success(&format!("Rolled back to {}", build));
    Ok(())
}

pub async fn scale(
    orchestrator: &ClusterOrchestrator,
    tenant: &TenantName,
    app: &AppName,
    replicas: u32,
    output: &Output,
) -> Result<()> {
    if !orchestrator.scale(tenant, app, replicas).await? {
        return Err(Error::NotApplicable(format!(
            "{}/{} is not deployed",
            tenant, app
        )));
    }

    output.success(&format!("Scaled {}-{} to {} replica(s)", app, tenant, replicas));
    Ok(())
}

pub async fn remove(
    orchestrator: &ClusterOrchestrator,
    tenant: &TenantName,
    app: &AppName,
    output: &Output,
) -> Result<()> {
    output.progress(&format!("Removing {}/{}", tenant, app));
    if !orchestrator.remove(tenant, app).await? {
        return Err(Error::NotApplicable(format!(
            "{}/{} is not deployed",
            tenant, app
        )));
    }

    output.success(&format!("Removed {}-{}", app, tenant));
    Ok(())
}

pub async fn purge_image(
    orchestrator: &ClusterOrchestrator,
    tenant: &TenantName,
    app: &AppName,
    build: &str,
    output: &Output,
) -> Result<()> {
    let removed = orchestrator.purge_image(tenant, app, build).await?;
    output.success(&format!("Removed image {}", removed));
    Ok(())
}
