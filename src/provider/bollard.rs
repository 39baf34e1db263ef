// ABOUTME: Image builder backed by a Docker-compatible engine API (Docker or Podman).
// ABOUTME: Renders a Dockerfile around the web artifact and builds from an in-memory tar context.

use crate::provider::detection::{DetectionError, RuntimeInfo, RuntimeType};
use crate::provider::image::{BuildRequest, ImageBuilder, ImageError, ImageSummary};
use crate::types::{AppName, TenantName, image_reference, matches_tuple};
use async_trait::async_trait;
use bollard::Docker;
use bollard::query_parameters::{
    BuildImageOptionsBuilder, ListImagesOptions, RemoveImageOptions,
};
use bytes::Bytes;
use futures::StreamExt;
use tracing::debug;

// =============================================================================
// Error Mapping Helpers
// =============================================================================

fn map_build_error(e: bollard::errors::Error, reference: &str) -> ImageError {
    ImageError::BuildFailed {
        reference: reference.to_string(),
        message: e.to_string(),
    }
}

fn map_image_remove_error(e: bollard::errors::Error, reference: &str) -> ImageError {
    match &e {
        bollard::errors::Error::DockerResponseServerError { status_code, .. }
            if *status_code == 404 =>
        {
            ImageError::NotFound(reference.to_string())
        }
        bollard::errors::Error::DockerResponseServerError { status_code, .. }
            if *status_code == 409 =>
        {
            ImageError::InUse(reference.to_string())
        }
        _ => ImageError::Runtime(format!("failed to remove {}: {}", reference, e)),
    }
}

// =============================================================================
// Build Recipe
// =============================================================================

/// Dockerfile template wrapped around a web artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DockerfileTemplate {
    pub base_image: String,
    /// Directory inside the image the artifact is added to.
    pub deploy_dir: String,
    pub command: Vec<String>,
}

impl Default for DockerfileTemplate {
    fn default() -> Self {
        Self {
            base_image: "tomcat".to_string(),
            deploy_dir: "/usr/local/tomcat/webapps/".to_string(),
            command: vec!["catalina.sh".to_string(), "run".to_string()],
        }
    }
}

impl DockerfileTemplate {
    pub fn render(&self, artifact_file: &str) -> String {
        // JSON array form so arguments are not passed through a shell.
        let command = serde_json::to_string(&self.command).unwrap_or_else(|_| "[]".to_string());
        format!(
            "FROM {}\nADD {} {}\nCMD {}\n",
            self.base_image, artifact_file, self.deploy_dir, command
        )
    }
}

/// Tar archive holding `Dockerfile` and the artifact side by side.
fn build_context(dockerfile: &str, artifact_file: &str, artifact: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut archive = tar::Builder::new(Vec::new());

    for (name, data) in [("Dockerfile", dockerfile.as_bytes()), (artifact_file, artifact)] {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        archive.append_data(&mut header, name, data)?;
    }

    archive.into_inner()
}

// =============================================================================
// BollardImageBuilder
// =============================================================================

pub struct BollardImageBuilder {
    client: Docker,
    runtime_type: RuntimeType,
    template: DockerfileTemplate,
}

impl BollardImageBuilder {
    pub fn new(client: Docker, runtime_type: RuntimeType, template: DockerfileTemplate) -> Self {
        Self {
            client,
            runtime_type,
            template,
        }
    }

    /// Connect to the engine socket found by detection.
    pub fn connect(info: &RuntimeInfo, template: DockerfileTemplate) -> Result<Self, DetectionError> {
        let client =
            Docker::connect_with_unix(&info.socket_path, 120, bollard::API_DEFAULT_VERSION)
                .map_err(|e| DetectionError::ConnectionFailed {
                    socket: info.socket_path.clone(),
                    message: e.to_string(),
                })?;
        Ok(Self::new(client, info.runtime_type, template))
    }

    pub fn runtime_type(&self) -> RuntimeType {
        self.runtime_type
    }
}

#[async_trait]
impl ImageBuilder for BollardImageBuilder {
    async fn build_image(&self, request: &BuildRequest) -> Result<String, ImageError> {
        let reference = image_reference(&request.tenant, &request.app, &request.version);

        let artifact_file = request
            .artifact
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| ImageError::Artifact(request.artifact.display().to_string()))?
            .to_string();
        let artifact = tokio::fs::read(&request.artifact)
            .await
            .map_err(|e| ImageError::Artifact(format!("{}: {}", request.artifact.display(), e)))?;

        let dockerfile = self.template.render(&artifact_file);
        let context = build_context(&dockerfile, &artifact_file, &artifact)
            .map_err(|e| ImageError::Artifact(format!("failed to pack build context: {}", e)))?;

        debug!(image = %reference, bytes = context.len(), "building image");

        let options = BuildImageOptionsBuilder::default()
            .dockerfile("Dockerfile")
            .t(&reference)
            .rm(true)
            .build();

        let mut stream =
            self.client
                .build_image(options, None, Some(bollard::body_full(Bytes::from(context))));
        while let Some(item) = stream.next().await {
            let info = item.map_err(|e| map_build_error(e, &reference))?;
            if let Some(detail) = info.error_detail {
                return Err(ImageError::BuildFailed {
                    reference,
                    message: detail.message.unwrap_or_default(),
                });
            }
            if let Some(line) = info.stream {
                let line = line.trim_end();
                if !line.is_empty() {
                    debug!(image = %reference, "{}", line);
                }
            }
        }

        Ok(reference)
    }

    async fn existing_images(
        &self,
        tenant: &TenantName,
        app: &AppName,
        version: &str,
    ) -> Result<Vec<ImageSummary>, ImageError> {
        let images = self
            .client
            .list_images(Some(ListImagesOptions::default()))
            .await
            .map_err(|e| ImageError::Runtime(format!("failed to list images: {}", e)))?;

        Ok(images
            .into_iter()
            .filter(|image| {
                image
                    .repo_tags
                    .iter()
                    .any(|tag| matches_tuple(tag, tenant, app, version))
            })
            .map(|image| ImageSummary {
                id: image.id,
                repo_tags: image.repo_tags,
            })
            .collect())
    }

    async fn image_exists(&self, reference: &str) -> Result<bool, ImageError> {
        match self.client.inspect_image(reference).await {
            Ok(_) => Ok(true),
            Err(bollard::errors::Error::DockerResponseServerError {
                status_code: 404, ..
            }) => Ok(false),
            Err(e) => Err(ImageError::Runtime(format!(
                "failed to inspect {}: {}",
                reference, e
            ))),
        }
    }

    async fn remove_image(
        &self,
        tenant: &TenantName,
        app: &AppName,
        version: &str,
    ) -> Result<String, ImageError> {
        let reference = image_reference(tenant, app, version);

        let opts = RemoveImageOptions {
            force: false,
            ..Default::default()
        };

        self.client
            .remove_image(&reference, Some(opts), None)
            .await
            .map_err(|e| map_image_remove_error(e, &reference))?;

        Ok(reference)
    }
}
