// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "webdeploy")]
#[command(about = "Deploy tenant web applications as replicated workloads on Kubernetes")]
#[command(version)]
pub struct Cli {
    /// Configuration file (defaults to WEBDEPLOY_CONFIG, then webdeploy.yml discovery)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the cluster namespace
    #[arg(short, long, global = true, env = "WEBDEPLOY_NAMESPACE")]
    pub namespace: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print final results
    #[arg(short, long, global = true, conflicts_with = "json")]
    pub quiet: bool,

    /// Print JSON lines
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// The tenant application a command acts on.
#[derive(Args, Debug, Clone)]
pub struct Target {
    /// Tenant owning the application
    #[arg(short, long)]
    pub tenant: String,

    /// Application name
    #[arg(short, long)]
    pub app: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a webdeploy.yml configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Build and deploy a new application version
    Deploy {
        #[command(flatten)]
        target: Target,

        /// Web artifact to deploy (e.g. a .war file)
        #[arg(long)]
        artifact: PathBuf,

        /// Version of the artifact
        #[arg(long = "app-version", alias = "release")]
        version: String,

        /// Number of replicas
        #[arg(short, long, default_value_t = 1)]
        replicas: u32,
    },

    /// Rebuild a deployed version from a new artifact and roll it out
    Update {
        #[command(flatten)]
        target: Target,

        #[arg(long)]
        artifact: PathBuf,

        #[arg(long = "app-version", alias = "release")]
        version: String,
    },

    /// Switch the workload back to an earlier build
    Rollback {
        #[command(flatten)]
        target: Target,

        #[arg(long = "app-version", alias = "release")]
        version: String,

        /// Build identifier to roll back to (defaults to the newest earlier build)
        #[arg(long)]
        build: Option<String>,
    },

    /// Change the number of replicas
    Scale {
        #[command(flatten)]
        target: Target,

        #[arg(short, long)]
        replicas: u32,
    },

    /// Remove the workload, its instances and its service
    Remove {
        #[command(flatten)]
        target: Target,
    },

    /// List builds of an application version
    Builds {
        #[command(flatten)]
        target: Target,

        #[arg(long = "app-version", alias = "release")]
        version: String,

        /// Only builds newer than the live one
        #[arg(long, conflicts_with = "lower")]
        higher: bool,

        /// Only builds older than the live one
        #[arg(long)]
        lower: bool,
    },

    /// Show replica count and access URLs
    Status {
        #[command(flatten)]
        target: Target,

        /// Deployed artifact; its name is the URL path (defaults to the app name)
        #[arg(long)]
        artifact: Option<PathBuf>,
    },

    /// Delete one built image
    PurgeImage {
        #[command(flatten)]
        target: Target,

        /// Build identifier of the image
        #[arg(long)]
        build: String,
    },
}
