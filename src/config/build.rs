// ABOUTME: Build recipe settings for wrapping a web artifact in a servlet container image.
// ABOUTME: Defaults produce a Tomcat image serving the artifact on port 8080.

use serde::Deserialize;

use crate::provider::DockerfileTemplate;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BuildConfig {
    #[serde(default = "default_base_image")]
    pub base_image: String,

    #[serde(default = "default_deploy_dir")]
    pub deploy_dir: String,

    #[serde(default = "default_command")]
    pub command: Vec<String>,

    /// Port the servlet container listens on inside each instance.
    #[serde(default = "default_container_port")]
    pub container_port: u16,
}

fn default_base_image() -> String {
    "tomcat".to_string()
}

fn default_deploy_dir() -> String {
    "/usr/local/tomcat/webapps/".to_string()
}

fn default_command() -> Vec<String> {
    vec!["catalina.sh".to_string(), "run".to_string()]
}

fn default_container_port() -> u16 {
    8080
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            base_image: default_base_image(),
            deploy_dir: default_deploy_dir(),
            command: default_command(),
            container_port: default_container_port(),
        }
    }
}

impl BuildConfig {
    pub fn template(&self) -> DockerfileTemplate {
        DockerfileTemplate {
            base_image: self.base_image.clone(),
            deploy_dir: self.deploy_dir.clone(),
            command: self.command.clone(),
        }
    }
}
