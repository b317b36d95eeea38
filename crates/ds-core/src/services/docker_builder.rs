use crate::error::{Result, SyncError};
use crate::models::{DesireRequest, RunSpecification};

use super::recipe_builder::{
    ensure_single_source, BuilderConfig, Recipe, RecipeBuilder, SidecarLaunch,
};
use super::{actions, docker_image, execution_metadata};

pub const DOCKER_LIFECYCLE_KEY: &str = "docker";
const DOCKER_CACHE_KEY: &str = "docker-lifecycle";
const DEFAULT_DOCKER_USER: &str = "root";

/// Builds run specifications for applications shipped as docker images.
#[derive(Clone)]
pub struct DockerRecipeBuilder {
    config: BuilderConfig,
}

impl DockerRecipeBuilder {
    pub fn new(config: BuilderConfig) -> Self {
        Self { config }
    }
}

impl RecipeBuilder for DockerRecipeBuilder {
    fn build(&self, request: &DesireRequest) -> Result<RunSpecification> {
        let guid = request.process_guid.as_str();
        tracing::debug!(process_guid = %guid, "building_docker_run_spec");

        ensure_single_source(request)?;
        let image = request.docker_image().ok_or_else(|| {
            tracing::error!(process_guid = %guid, "docker_image_missing");
            SyncError::DockerImageMissing
        })?;

        let lifecycle_path = self
            .config
            .lifecycle_path(DOCKER_LIFECYCLE_KEY)
            .inspect_err(|e| tracing::error!(process_guid = %guid, error = %e, "lifecycle_missing"))?;

        let root_fs = docker_image::resolve(image).inspect_err(|e| {
            tracing::error!(process_guid = %guid, error = %e, "converting_docker_image_failed")
        })?;

        let metadata = execution_metadata::parse(&request.execution_metadata).inspect_err(|e| {
            tracing::error!(process_guid = %guid, error = %e, "parsing_execution_metadata_failed")
        })?;

        let ports = match request.explicit_ports() {
            Some(ports) => ports.to_vec(),
            None => metadata.exposed_ports().inspect_err(|e| {
                tracing::error!(process_guid = %guid, error = %e, "parsing_exposed_ports_failed")
            })?,
        };

        let user = metadata.user().unwrap_or(DEFAULT_DOCKER_USER).to_string();
        let setup = vec![actions::lifecycle_download(
            &self.config.file_server_url,
            lifecycle_path,
            DOCKER_CACHE_KEY,
            &user,
        )];

        self.config.assemble(Recipe {
            request,
            root_fs,
            user,
            ports,
            setup,
            privileged: false,
            environment_variables: Vec::new(),
            sidecar_launch: SidecarLaunch::Launcher,
        })
    }
}
