// ABOUTME: Command module aggregator for the webdeploy CLI.
// ABOUTME: Validates target names, connects, and routes each subcommand to its handler.

mod connect;
mod lifecycle;
mod query;

use crate::cli::{Commands, Target};
use webdeploy::config::Config;
use webdeploy::error::Result;
use webdeploy::output::Output;
use webdeploy::types::{AppName, TenantName};

fn names(target: &Target) -> Result<(TenantName, AppName)> {
    Ok((TenantName::new(&target.tenant)?, AppName::new(&target.app)?))
}

pub async fn dispatch(command: Commands, config: &Config, output: &mut Output) -> Result<()> {
    output.start_timer();

    match command {
        // Handled before configuration is loaded.
        Commands::Init { .. } => Ok(()),
        Commands::Deploy {
            target,
            artifact,
            version,
            replicas,
        } => {
            let (tenant, app) = names(&target)?;
            let orchestrator = connect::connect(config, output).await?;
            lifecycle::deploy(&orchestrator, &tenant, &app, &artifact, &version, replicas, output)
                .await
        }
        Commands::Update {
            target,
            artifact,
            version,
        } => {
            let (tenant, app) = names(&target)?;
            let orchestrator = connect::connect(config, output).await?;
            lifecycle::update(&orchestrator, &tenant, &app, &artifact, &version, output).await
        }
        Commands::Rollback {
            target,
            version,
            build,
        } => {
            let (tenant, app) = names(&target)?;
            let orchestrator = connect::connect(config, output).await?;
            lifecycle::rollback(&orchestrator, &tenant, &app, &version, build, output).await
        }
        Commands::Scale { target, replicas } => {
            let (tenant, app) = names(&target)?;
            let orchestrator = connect::connect(config, output).await?;
            lifecycle::scale(&orchestrator, &tenant, &app, replicas, output).await
        }
        Commands::Remove { target } => {
            let (tenant, app) = names(&target)?;
            let orchestrator = connect::connect(config, output).await?;
            lifecycle::remove(&orchestrator, &tenant, &app, output).await
        }
        Commands::PurgeImage { target, build } => {
            let (tenant, app) = names(&target)?;
            let orchestrator = connect::connect(config, output).await?;
            lifecycle::purge_image(&orchestrator, &tenant, &app, &build, output).await
        }
        Commands::Builds {
            target,
            version,
            higher,
            lower,
        } => {
            let (tenant, app) = names(&target)?;
            let orchestrator = connect::connect(config, output).await?;
            let filter = match (higher, lower) {
                (true, _) => query::BuildFilter::Higher,
                (_, true) => query::BuildFilter::Lower,
                _ => query::BuildFilter::All,
            };
            query::builds(&orchestrator, &tenant, &app, &version, filter, output).await
        }
        Commands::Status { target, artifact } => {
            let (tenant, app) = names(&target)?;
            let orchestrator = connect::connect(config, output).await?;
            query::status(&orchestrator, &tenant, &app, artifact.as_deref(), output).await
        }
    }
}
