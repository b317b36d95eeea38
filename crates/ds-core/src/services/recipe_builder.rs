use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{Result, SyncError};
use crate::models::{
    DesireRequest, DownloadAction, EnvironmentVariable, ResourceLimits, RunAction,
    RunSpecification, SyncConfig,
};

use super::actions::{self, LAUNCHER_PATH, LIFECYCLE_DIR, SSHD_DIR};
use super::docker_builder::DockerRecipeBuilder;
use super::droplet_builder::DropletRecipeBuilder;
use super::routes;
use super::ssh::{KeyFactory, SshSidecar, DEFAULT_SSH_PORT};

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_LANG: &str = "en_US.UTF-8";
pub const LRP_DOMAIN: &str = "cf-apps";
pub const LRP_LOG_SOURCE: &str = "CELL";
pub const SSHD_LIFECYCLE_KEY: &str = "diego-sshd";
const SSHD_BINARY: &str = "diego-sshd";

/// Compiles a desire request into a run specification. All or nothing: an
/// error never comes with a partial result.
pub trait RecipeBuilder: Send + Sync {
    fn build(&self, request: &DesireRequest) -> Result<RunSpecification>;
}

/// Settings shared by every builder, fixed at construction.
#[derive(Clone)]
pub struct BuilderConfig {
    pub lifecycles: HashMap<String, String>,
    pub file_server_url: String,
    pub file_descriptor_limit: u64,
    pub min_cpu_proxy: u32,
    pub max_cpu_proxy: u32,
    pub privileged_containers: bool,
    pub key_factory: Arc<dyn KeyFactory>,
}

impl BuilderConfig {
    pub fn new(
        lifecycles: HashMap<String, String>,
        file_server_url: impl Into<String>,
        key_factory: Arc<dyn KeyFactory>,
    ) -> Self {
        Self {
            lifecycles,
            file_server_url: file_server_url.into(),
            file_descriptor_limit: crate::models::config::DEFAULT_FILE_DESCRIPTOR_LIMIT,
            min_cpu_proxy: crate::models::config::MIN_CPU_PROXY,
            max_cpu_proxy: crate::models::config::MAX_CPU_PROXY,
            privileged_containers: false,
            key_factory,
        }
    }

    pub fn from_sync_config(config: &SyncConfig, key_factory: Arc<dyn KeyFactory>) -> Self {
        Self {
            lifecycles: config.lifecycles.clone(),
            file_server_url: config.file_server_url.clone(),
            file_descriptor_limit: config.file_descriptor_limit,
            min_cpu_proxy: config.min_cpu_proxy,
            max_cpu_proxy: config.max_cpu_proxy,
            privileged_containers: config.privileged_containers,
            key_factory,
        }
    }

    pub fn lifecycle_path(&self, key: &str) -> Result<&str> {
        self.lifecycles
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| SyncError::NoLifecycleDefined(key.to_string()))
    }

    /// The request's file descriptor limit, or the default when it asks for none.
    pub fn nofile(&self, requested: u64) -> u64 {
        if requested == 0 {
            self.file_descriptor_limit
        } else {
            requested
        }
    }

    pub fn cpu_weight(&self, memory_mb: u32) -> u32 {
        cpu_weight(memory_mb, self.min_cpu_proxy, self.max_cpu_proxy)
    }

    /// Shared assembly of a run specification from the strategy-specific parts.
    pub(crate) fn assemble(&self, recipe: Recipe<'_>) -> Result<RunSpecification> {
        let request = recipe.request;
        let nofile = self.nofile(request.file_descriptors);
        let app_ports = dedup_ports(recipe.ports);
        let primary_port = app_ports.first().copied().unwrap_or(DEFAULT_PORT);
        let env = actions::app_env(&request.environment, primary_port);
        let mut setup = recipe.setup;
        let mut ports = app_ports.clone();

        let app = actions::launcher(
            &recipe.user,
            &request.start_command,
            &request.execution_metadata,
            env.clone(),
            nofile,
        );

        let (sidecar_step, ssh_route) = if request.allow_ssh {
            let sidecar = SshSidecar::provision(self.key_factory.as_ref())?;
            let daemon_path = match self.lifecycles.get(SSHD_LIFECYCLE_KEY) {
                Some(path) => {
                    setup.push(DownloadAction {
                        from: actions::static_url(&self.file_server_url, path),
                        to: SSHD_DIR.to_string(),
                        cache_key: SSHD_LIFECYCLE_KEY.to_string(),
                        user: recipe.user.clone(),
                    });
                    format!("{SSHD_DIR}/{SSHD_BINARY}")
                }
                None => format!("{LIFECYCLE_DIR}/{SSHD_BINARY}"),
            };
            let (path, args) = match recipe.sidecar_launch {
                SidecarLaunch::Launcher => (
                    LAUNCHER_PATH.to_string(),
                    vec![
                        LIFECYCLE_DIR.to_string(),
                        sidecar.daemon_command(&daemon_path),
                        request.execution_metadata.clone(),
                    ],
                ),
                SidecarLaunch::Direct => (daemon_path, sidecar.daemon_args()),
            };
            if !ports.contains(&DEFAULT_SSH_PORT) {
                ports.push(DEFAULT_SSH_PORT);
            }
            let step = RunAction {
                path,
                args,
                env,
                resource_limits: ResourceLimits::nofile(nofile),
                user: recipe.user.clone(),
                log_source: None,
            };
            (Some(step), Some(sidecar.route()))
        } else {
            (None, None)
        };

        let routes = routes::routing_table(
            &request.routing_info.http_routes,
            primary_port,
            ssh_route.as_ref(),
        )?;

        Ok(RunSpecification {
            process_guid: request.process_guid.clone(),
            domain: LRP_DOMAIN.to_string(),
            instances: request.num_instances,
            cpu_weight: self.cpu_weight(request.memory_mb),
            root_fs: recipe.root_fs,
            memory_mb: request.memory_mb,
            disk_mb: request.disk_mb,
            ports,
            privileged: recipe.privileged,
            start_timeout_secs: request.health_check_timeout_in_seconds,
            log_guid: request.log_guid.clone(),
            log_source: LRP_LOG_SOURCE.to_string(),
            metrics_guid: request.log_guid.clone(),
            routes,
            egress_rules: request.egress_rules.clone(),
            annotation: request.etag.clone(),
            setup: actions::setup(setup),
            action: actions::run(app, sidecar_step),
            monitor: actions::monitor(
                request.health_check_type,
                &recipe.user,
                &app_ports,
                self.file_descriptor_limit,
            ),
            environment_variables: recipe.environment_variables,
        })
    }
}

/// How the ssh daemon is started inside the container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SidecarLaunch {
    /// Through the lifecycle launcher as a single command string.
    Launcher,
    /// By executing the daemon binary with an argument vector.
    Direct,
}

/// What a deployment strategy contributes to the shared assembly.
pub(crate) struct Recipe<'a> {
    pub request: &'a DesireRequest,
    pub root_fs: String,
    pub user: String,
    pub ports: Vec<u16>,
    pub setup: Vec<DownloadAction>,
    pub privileged: bool,
    pub environment_variables: Vec<EnvironmentVariable>,
    pub sidecar_launch: SidecarLaunch,
}

/// Scale memory between the proxy bounds onto a 1..=100 cpu weight.
pub fn cpu_weight(memory_mb: u32, min_cpu_proxy: u32, max_cpu_proxy: u32) -> u32 {
    if memory_mb >= max_cpu_proxy {
        return 100;
    }
    if memory_mb <= min_cpu_proxy {
        return 1;
    }
    let scaled = 99 * u64::from(memory_mb - min_cpu_proxy)
        / u64::from(max_cpu_proxy - min_cpu_proxy);
    scaled as u32 + 1
}

/// Reject requests that name both a docker image and a droplet.
pub(crate) fn ensure_single_source(request: &DesireRequest) -> Result<()> {
    if request.docker_image().is_some() && request.droplet_uri().is_some() {
        tracing::error!(process_guid = %request.process_guid, "multiple_app_sources");
        return Err(SyncError::MultipleAppSources);
    }
    Ok(())
}

fn dedup_ports(ports: Vec<u16>) -> Vec<u16> {
    let mut unique = Vec::with_capacity(ports.len());
    for port in ports {
        if !unique.contains(&port) {
            unique.push(port);
        }
    }
    unique
}

/// One builder per deployment source.
pub struct RecipeBuilders {
    pub docker: DockerRecipeBuilder,
    pub droplet: DropletRecipeBuilder,
}

impl RecipeBuilders {
    pub fn new(config: BuilderConfig) -> Self {
        Self {
            docker: DockerRecipeBuilder::new(config.clone()),
            droplet: DropletRecipeBuilder::new(config),
        }
    }

    /// Requests with a docker image go to the docker builder, everything
    /// else to the droplet builder (which reports a missing source).
    pub fn for_request(&self, request: &DesireRequest) -> &dyn RecipeBuilder {
        if request.docker_image().is_some() {
            &self.docker
        } else {
            &self.droplet
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::models::{HealthCheckType, HttpRoute, RoutingInfo, SecurityGroupRule};

    pub fn builder_config(key_factory: Arc<dyn KeyFactory>) -> BuilderConfig {
        let lifecycles = HashMap::from([
            ("docker".to_string(), "the/docker/lifecycle/path.tgz".to_string()),
            (
                "buildpack/some-stack".to_string(),
                "some-lifecycle.tgz".to_string(),
            ),
        ]);
        BuilderConfig::new(lifecycles, "http://file-server.com", key_factory)
    }

    /// A request with every field populated and no deployment source set.
    pub fn desire_request() -> DesireRequest {
        DesireRequest {
            process_guid: "the-app-guid-the-app-version".into(),
            droplet_uri: None,
            docker_image: None,
            stack: "some-stack".into(),
            start_command: "the-start-command with-arguments".into(),
            execution_metadata: "{}".into(),
            environment: vec![EnvironmentVariable::new("foo", "bar")],
            memory_mb: 128,
            disk_mb: 512,
            file_descriptors: 32,
            num_instances: 23,
            routing_info: RoutingInfo {
                http_routes: vec![HttpRoute::new("route1"), HttpRoute::new("route2")],
            },
            log_guid: "the-log-id".into(),
            health_check_type: HealthCheckType::Port,
            health_check_timeout_in_seconds: 123456,
            egress_rules: vec![SecurityGroupRule {
                protocol: "TCP".into(),
                destinations: vec!["0.0.0.0/0".into()],
                ports: vec![80, 443],
                port_range: None,
                icmp_info: None,
                log: false,
            }],
            etag: "etag-updated-at".into(),
            ports: None,
            allow_ssh: false,
        }
    }

    pub fn http_routes(routes: &[(&str, u16)]) -> Vec<HttpRoute> {
        routes
            .iter()
            .map(|(hostname, port)| HttpRoute {
                port: Some(*port),
                ..HttpRoute::new(*hostname)
            })
            .collect()
    }
}
