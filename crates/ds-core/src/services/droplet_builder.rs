use crate::error::{Result, SyncError};
use crate::models::{DesireRequest, DownloadAction, EnvironmentVariable, RunSpecification};

use super::actions;
use super::recipe_builder::{
    ensure_single_source, BuilderConfig, Recipe, RecipeBuilder, SidecarLaunch, DEFAULT_LANG,
    DEFAULT_PORT,
};

const DROPLET_USER: &str = "vcap";
const DROPLET_DIR: &str = ".";

/// Builds run specifications for buildpack-staged droplets running on a
/// preloaded stack.
#[derive(Clone)]
pub struct DropletRecipeBuilder {
    config: BuilderConfig,
}

impl DropletRecipeBuilder {
    pub fn new(config: BuilderConfig) -> Self {
        Self { config }
    }
}

impl RecipeBuilder for DropletRecipeBuilder {
    fn build(&self, request: &DesireRequest) -> Result<RunSpecification> {
        let guid = request.process_guid.as_str();
        tracing::debug!(process_guid = %guid, stack = %request.stack, "building_droplet_run_spec");

        ensure_single_source(request)?;
        let droplet_uri = request.droplet_uri().ok_or_else(|| {
            tracing::error!(process_guid = %guid, "droplet_source_missing");
            SyncError::DropletSourceMissing
        })?;

        let lifecycle_key = format!("buildpack/{}", request.stack);
        let lifecycle_path = self
            .config
            .lifecycle_path(&lifecycle_key)
            .inspect_err(|e| tracing::error!(process_guid = %guid, error = %e, "lifecycle_missing"))?;

        let setup = vec![
            actions::lifecycle_download(
                &self.config.file_server_url,
                lifecycle_path,
                &format!("buildpack-{}-lifecycle", request.stack),
                DROPLET_USER,
            ),
            DownloadAction {
                from: droplet_uri.to_string(),
                to: DROPLET_DIR.to_string(),
                cache_key: format!("droplets-{guid}"),
                user: DROPLET_USER.to_string(),
            },
        ];

        let ports = request
            .explicit_ports()
            .map(<[u16]>::to_vec)
            .unwrap_or_else(|| vec![DEFAULT_PORT]);

        self.config.assemble(Recipe {
            request,
            root_fs: format!("preloaded:{}", request.stack),
            user: DROPLET_USER.to_string(),
            ports,
            setup,
            privileged: self.config.privileged_containers,
            environment_variables: vec![EnvironmentVariable::new("LANG", DEFAULT_LANG)],
            sidecar_launch: SidecarLaunch::Direct,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::models::{Action, ResourceLimits, RunAction};
    use crate::services::recipe_builder::testing::{builder_config, desire_request};
    use crate::services::ssh::testing::FakeKeyFactory;
    use crate::services::ssh::SSH_ROUTE_SCHEME;

    fn droplet_request() -> DesireRequest {
        let mut request = desire_request();
        request.droplet_uri = Some("http://the-droplet.uri.com".into());
        request
    }

    fn builder() -> DropletRecipeBuilder {
        DropletRecipeBuilder::new(builder_config(Arc::new(FakeKeyFactory::host_and_user())))
    }

    #[test]
    fn builds_a_preloaded_run_specification() {
        let spec = builder().build(&droplet_request()).unwrap();

        assert_eq!(spec.root_fs, "preloaded:some-stack");
        assert_eq!(spec.ports, vec![8080]);
        assert!(!spec.privileged);
        assert_eq!(
            spec.environment_variables,
            vec![EnvironmentVariable::new("LANG", "en_US.UTF-8")]
        );
        assert_eq!(spec.annotation, "etag-updated-at");
        assert_eq!(spec.metrics_guid, "the-log-id");

        assert_eq!(
            spec.setup,
            Action::Serial(vec![
                Action::Download(DownloadAction {
                    from: "http://file-server.com/v1/static/some-lifecycle.tgz".into(),
                    to: "/tmp/lifecycle".into(),
                    cache_key: "buildpack-some-stack-lifecycle".into(),
                    user: "vcap".into(),
                }),
                Action::Download(DownloadAction {
                    from: "http://the-droplet.uri.com".into(),
                    to: ".".into(),
                    cache_key: "droplets-the-app-guid-the-app-version".into(),
                    user: "vcap".into(),
                }),
            ])
        );

        let Action::Run(app) = &spec.action else {
            panic!("expected a single run step, got {:?}", spec.action);
        };
        assert_eq!(app.user, "vcap");
        assert_eq!(app.path, "/tmp/lifecycle/launcher");
        assert_eq!(app.resource_limits, ResourceLimits::nofile(32));

        let monitor = spec.monitor.as_ref().unwrap();
        assert!(monitor.run_steps().iter().all(|r| r.user == "vcap"));
    }

    #[test]
    fn privileged_flag_follows_config() {
        let mut config = builder_config(Arc::new(FakeKeyFactory::host_and_user()));
        config.privileged_containers = true;
        let spec = DropletRecipeBuilder::new(config)
            .build(&droplet_request())
            .unwrap();
        assert!(spec.privileged);
    }

    #[test]
    fn explicit_ports_replace_the_default() {
        let mut request = droplet_request();
        request.ports = Some(vec![9090, 9091]);
        let spec = builder().build(&request).unwrap();
        assert_eq!(spec.ports, vec![9090, 9091]);
        assert_eq!(spec.monitor.unwrap().run_steps().len(), 2);
    }

    #[test]
    fn ssh_runs_the_daemon_directly() {
        let mut request = droplet_request();
        request.allow_ssh = true;
        let spec = builder().build(&request).unwrap();

        assert_eq!(spec.ports, vec![8080, 2222]);
        assert!(spec.routes.contains_key(SSH_ROUTE_SCHEME));

        let Action::Codependent(steps) = &spec.action else {
            panic!("expected a codependent run tree, got {:?}", spec.action);
        };
        let Action::Run(sidecar) = &steps[1] else {
            panic!("sidecar should be a run step");
        };
        assert_eq!(
            sidecar,
            &RunAction {
                path: "/tmp/lifecycle/diego-sshd".into(),
                args: vec![
                    "-address=0.0.0.0:2222".into(),
                    "-hostKey=pem-host-private-key".into(),
                    "-authorizedKey=authorized-user-key".into(),
                    "-inheritDaemonEnv".into(),
                    "-logLevel=fatal".into(),
                ],
                env: vec![
                    EnvironmentVariable::new("foo", "bar"),
                    EnvironmentVariable::new("PORT", "8080"),
                ],
                resource_limits: ResourceLimits::nofile(32),
                user: "vcap".into(),
                log_source: None,
            }
        );
    }

    #[test]
    fn separate_sidecar_bundle_is_run_from_its_own_directory() {
        let mut config = builder_config(Arc::new(FakeKeyFactory::host_and_user()));
        config
            .lifecycles
            .insert("diego-sshd".into(), "diego-sshd/diego-sshd.tgz".into());
        let mut request = droplet_request();
        request.allow_ssh = true;
        let spec = DropletRecipeBuilder::new(config).build(&request).unwrap();

        let destinations: Vec<&str> = spec.setup.downloads().iter().map(|d| d.to.as_str()).collect();
        assert_eq!(destinations, vec!["/tmp/lifecycle", ".", "/tmp/ssh"]);
        assert_eq!(spec.action.run_steps()[1].path, "/tmp/ssh/diego-sshd");
    }

    #[test]
    fn unknown_stack_is_an_error() {
        let mut request = droplet_request();
        request.stack = "other-stack".into();
        assert!(matches!(
            builder().build(&request),
            Err(SyncError::NoLifecycleDefined(key)) if key == "buildpack/other-stack"
        ));
    }

    #[test]
    fn missing_droplet_is_an_error() {
        assert!(matches!(
            builder().build(&desire_request()),
            Err(SyncError::DropletSourceMissing)
        ));
    }

    #[test]
    fn both_sources_is_an_error() {
        let mut request = droplet_request();
        request.docker_image = Some("busybox".into());
        assert!(matches!(
            builder().build(&request),
            Err(SyncError::MultipleAppSources)
        ));
    }
}
