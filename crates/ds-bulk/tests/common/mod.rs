// Each test binary compiles this module independently and uses a different
// subset of helpers, so unused-function warnings are expected.
#![allow(dead_code)]

use std::path::Path;

use chrono::{DateTime, Duration, TimeZone, Utc};

use ds_core::services::bulk::{SyncFailure, SyncSummary};

/// Fixed pass start so rendered reports are deterministic.
pub fn fixed_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
}

/// Build a summary that started at [`fixed_start`] and ran for `elapsed_ms`.
pub fn make_summary(
    created: usize,
    updated: usize,
    deleted: usize,
    failures: &[(&str, &str)],
    elapsed_ms: i64,
) -> SyncSummary {
    SyncSummary {
        started_at: fixed_start(),
        finished_at: fixed_start() + Duration::milliseconds(elapsed_ms),
        created,
        updated,
        deleted,
        failures: failures
            .iter()
            .map(|(guid, error)| SyncFailure {
                process_guid: guid.to_string(),
                error: error.to_string(),
            })
            .collect(),
    }
}

/// Pin a real summary's timestamps so it can be snapshotted.
pub fn pin_times(mut summary: SyncSummary) -> SyncSummary {
    summary.started_at = fixed_start();
    summary.finished_at = fixed_start() + Duration::milliseconds(500);
    summary
}

pub fn write_file(dir: &Path, name: &str, contents: &str) {
    std::fs::create_dir_all(dir).unwrap();
    std::fs::write(dir.join(name), contents).unwrap();
}

/// A config pointing the registry and store into `root`.
pub fn write_config(root: &Path) -> std::path::PathBuf {
    let yaml = format!(
        r#"file_server_url: http://file-server.example.com:8080
lifecycles:
  docker: docker_app_lifecycle/docker_app_lifecycle.tgz
  buildpack/cflinuxfs4: buildpack_app_lifecycle/buildpack_app_lifecycle.tgz
registry_dir: {registry}
store_path: {store}
"#,
        registry = root.join("registry").display(),
        store = root.join("store").join("desired.json").display(),
    );
    write_file(root, "ds-sync.yaml", &yaml);
    root.join("ds-sync.yaml")
}

pub fn docker_app(guid: &str, etag: &str) -> String {
    format!(
        r#"process_guid: {guid}
docker_image: cloudfoundry/diego-docker-app:latest
start_command: /myapp
execution_metadata: '{{"ports":[{{"Port":8080,"Protocol":"tcp"}}]}}'
memory_mb: 256
disk_mb: 1024
num_instances: 2
log_guid: {guid}-logs
health_check_type: port
health_check_timeout_in_seconds: 60
etag: "{etag}"
allow_ssh: true
routing_info:
  http_routes:
    - hostname: {guid}.example.com
"#
    )
}

pub fn droplet_app(guid: &str, etag: &str) -> String {
    format!(
        r#"process_guid: {guid}
droplet_uri: http://blobstore.example.com/droplets/{guid}.tgz
stack: cflinuxfs4
start_command: bundle exec rackup
memory_mb: 512
num_instances: 1
log_guid: {guid}-logs
etag: "{etag}"
"#
    )
}
