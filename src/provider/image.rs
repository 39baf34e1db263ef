// ABOUTME: Image builder contract consumed by the orchestrator.
// ABOUTME: Build, list, probe and remove tenant application images.

use crate::types::{AppName, TenantName};
use async_trait::async_trait;
use std::path::PathBuf;

/// What to build: the stamped version and the packaged web artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRequest {
    pub tenant: TenantName,
    pub app: AppName,
    /// Version including the date/time suffix.
    pub version: String,
    pub artifact: PathBuf,
}

/// An image known to the builder, with every tag pointing at it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSummary {
    pub id: String,
    pub repo_tags: Vec<String>,
}

#[async_trait]
pub trait ImageBuilder: Send + Sync {
    /// Build an image from the artifact and return its reference.
    async fn build_image(&self, request: &BuildRequest) -> Result<String, ImageError>;

    /// Images with a tag containing `tenant/app:version`.
    async fn existing_images(
        &self,
        tenant: &TenantName,
        app: &AppName,
        version: &str,
    ) -> Result<Vec<ImageSummary>, ImageError>;

    /// Whether the reference resolves to an image yet.
    async fn image_exists(&self, reference: &str) -> Result<bool, ImageError>;

    /// Remove the image built for `tenant/app:version` and return its reference.
    async fn remove_image(
        &self,
        tenant: &TenantName,
        app: &AppName,
        version: &str,
    ) -> Result<String, ImageError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("image not found: {0}")]
    NotFound(String),

    #[error("artifact unreadable: {0}")]
    Artifact(String),

    #[error("build failed for {reference}: {message}")]
    BuildFailed { reference: String, message: String },

    #[error("image in use, cannot remove: {0}")]
    InUse(String),

    #[error("runtime error: {0}")]
    Runtime(String),
}
