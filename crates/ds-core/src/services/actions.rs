use std::time::Duration;

use crate::models::{
    Action, DownloadAction, EnvironmentVariable, HealthCheckType, ResourceLimits, RunAction,
};

pub const LIFECYCLE_DIR: &str = "/tmp/lifecycle";
pub const LAUNCHER_PATH: &str = "/tmp/lifecycle/launcher";
pub const HEALTHCHECK_PATH: &str = "/tmp/lifecycle/healthcheck";
pub const SSHD_DIR: &str = "/tmp/ssh";
pub const APP_LOG_SOURCE: &str = "APP";
pub const HEALTH_LOG_SOURCE: &str = "HEALTH";
pub const MONITOR_TIMEOUT: Duration = Duration::from_secs(30);

/// Location of a static asset on the file server.
pub fn static_url(file_server_url: &str, path: &str) -> String {
    format!(
        "{}/v1/static/{}",
        file_server_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Download of the lifecycle bundle into [`LIFECYCLE_DIR`].
pub fn lifecycle_download(
    file_server_url: &str,
    lifecycle_path: &str,
    cache_key: &str,
    user: &str,
) -> DownloadAction {
    DownloadAction {
        from: static_url(file_server_url, lifecycle_path),
        to: LIFECYCLE_DIR.to_string(),
        cache_key: cache_key.to_string(),
        user: user.to_string(),
    }
}

/// Setup runs every download in order before the instance starts.
pub fn setup(downloads: Vec<DownloadAction>) -> Action {
    Action::Serial(downloads.into_iter().map(Action::Download).collect())
}

/// Application variables plus `PORT` for the primary port.
pub fn app_env(environment: &[EnvironmentVariable], port: u16) -> Vec<EnvironmentVariable> {
    let mut env = environment.to_vec();
    env.push(EnvironmentVariable::new("PORT", port.to_string()));
    env
}

/// The launcher step that starts the application itself.
pub fn launcher(
    user: &str,
    start_command: &str,
    execution_metadata: &str,
    env: Vec<EnvironmentVariable>,
    nofile: u64,
) -> RunAction {
    RunAction {
        path: LAUNCHER_PATH.to_string(),
        args: vec![
            "app".to_string(),
            start_command.to_string(),
            execution_metadata.to_string(),
        ],
        env,
        resource_limits: ResourceLimits::nofile(nofile),
        user: user.to_string(),
        log_source: Some(APP_LOG_SOURCE.to_string()),
    }
}

/// The run tree: the application alone, or the application and its sidecar
/// bound together so that either one exiting takes down the other.
pub fn run(app: RunAction, sidecar: Option<RunAction>) -> Action {
    match sidecar {
        None => Action::Run(app),
        Some(sidecar) => Action::Codependent(vec![Action::Run(app), Action::Run(sidecar)]),
    }
}

/// One health check per port, run in parallel under a timeout. `None` when
/// the request opted out of health checking.
pub fn monitor(
    health_check: HealthCheckType,
    user: &str,
    ports: &[u16],
    nofile: u64,
) -> Option<Action> {
    match health_check {
        HealthCheckType::None => None,
        HealthCheckType::Port | HealthCheckType::Unspecified => {
            let checks = ports
                .iter()
                .map(|port| {
                    Action::Run(RunAction {
                        path: HEALTHCHECK_PATH.to_string(),
                        args: vec![format!("-port={port}")],
                        env: Vec::new(),
                        resource_limits: ResourceLimits::nofile(nofile),
                        user: user.to_string(),
                        log_source: Some(HEALTH_LOG_SOURCE.to_string()),
                    })
                })
                .collect();
            Some(Action::timeout(Action::Parallel(checks), MONITOR_TIMEOUT))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_url_joins_cleanly() {
        assert_eq!(
            static_url("http://file-server.com/", "/the/docker/lifecycle/path.tgz"),
            "http://file-server.com/v1/static/the/docker/lifecycle/path.tgz"
        );
    }

    #[test]
    fn app_env_appends_port() {
        let env = app_env(&[EnvironmentVariable::new("foo", "bar")], 8080);
        assert_eq!(
            env,
            vec![
                EnvironmentVariable::new("foo", "bar"),
                EnvironmentVariable::new("PORT", "8080"),
            ]
        );
    }

    #[test]
    fn run_without_sidecar_is_a_single_step() {
        let app = launcher("root", "start", "{}", vec![], 32);
        assert!(matches!(run(app, None), Action::Run(_)));
    }

    #[test]
    fn run_with_sidecar_is_codependent() {
        let app = launcher("root", "start", "{}", vec![], 32);
        let sidecar = launcher("root", "sshd", "{}", vec![], 32);
        match run(app, Some(sidecar)) {
            Action::Codependent(steps) => assert_eq!(steps.len(), 2),
            other => panic!("unexpected run tree: {other:?}"),
        }
    }

    #[test]
    fn monitor_checks_every_port() {
        let tree = monitor(HealthCheckType::Port, "root", &[8081, 8082], 1024).unwrap();
        let Action::Timeout { timeout, .. } = &tree else {
            panic!("monitor should be wrapped in a timeout");
        };
        assert_eq!(*timeout, MONITOR_TIMEOUT);

        let args: Vec<_> = tree.run_steps().iter().map(|r| r.args.clone()).collect();
        assert_eq!(args, vec![vec!["-port=8081"], vec!["-port=8082"]]);
    }

    #[test]
    fn unspecified_health_check_behaves_like_port() {
        assert_eq!(
            monitor(HealthCheckType::Unspecified, "root", &[8080], 1024),
            monitor(HealthCheckType::Port, "root", &[8080], 1024)
        );
    }

    #[test]
    fn none_health_check_has_no_monitor() {
        assert!(monitor(HealthCheckType::None, "root", &[8080], 1024).is_none());
    }
}
