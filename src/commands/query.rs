// ABOUTME: Read-only commands: build listings and deployment status.
// ABOUTME: Nothing here mutates cluster or image state.

use std::path::Path;

use super::connect::ClusterOrchestrator;
use webdeploy::error::Result;
use webdeploy::output::Output;
use webdeploy::types::{AppName, TenantName};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildFilter {
    All,
    Higher,
    Lower,
}

pub async fn builds(
    orchestrator: &ClusterOrchestrator,
    tenant: &TenantName,
    app: &AppName,
    version: &str,
    filter: BuildFilter,
    output: &Output,
) -> Result<()> {
    let (builds, label) = match filter {
        BuildFilter::All => (
            orchestrator.list_existing_builds(tenant, app, version).await?,
            "Builds",
        ),
        BuildFilter::Higher => (
            orchestrator.list_higher_builds(tenant, app, version).await?,
            "Builds newer than the live one",
        ),
        BuildFilter::Lower => (
            orchestrator.list_lower_builds(tenant, app, version).await?,
            "Builds older than the live one",
        ),
    };

    output.list(
        &format!("{} of {}/{}:{} ({})", label, tenant, app, version, builds.len()),
        &builds,
    );
    Ok(())
}

pub async fn status(
    orchestrator: &ClusterOrchestrator,
    tenant: &TenantName,
    app: &AppName,
    artifact: Option<&Path>,
    output: &Output,
) -> Result<()> {
    let replicas = orchestrator.replica_count(tenant, app).await?;
    let artifact = artifact.unwrap_or_else(|| Path::new(app.as_str()));
    let summary = orchestrator
        .service_access_summary(tenant, app, artifact)
        .await?;

    let lines: Vec<String> = std::iter::once(format!("Replicas: {}", replicas))
        .chain(summary.lines().filter(|l| !l.is_empty()).map(String::from))
        .collect();
    output.list(&format!("Status of {}-{}", app, tenant), &lines);
    Ok(())
}
