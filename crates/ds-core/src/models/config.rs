use std::collections::HashMap;
use std::path::PathBuf;

use serde::Deserialize;

pub const DEFAULT_FILE_DESCRIPTOR_LIMIT: u64 = 1024;
pub const MIN_CPU_PROXY: u32 = 256;
pub const MAX_CPU_PROXY: u32 = 8192;
pub const DEFAULT_SYNC_INTERVAL_SECS: u64 = 30;

#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    pub file_server_url: String,
    pub lifecycles: HashMap<String, String>,
    #[serde(default = "default_file_descriptor_limit")]
    pub file_descriptor_limit: u64,
    #[serde(default = "default_min_cpu_proxy")]
    pub min_cpu_proxy: u32,
    #[serde(default = "default_max_cpu_proxy")]
    pub max_cpu_proxy: u32,
    #[serde(default)]
    pub privileged_containers: bool,
    #[serde(default = "default_sync_interval_secs")]
    pub sync_interval_secs: u64,
    #[serde(default = "default_registry_dir")]
    pub registry_dir: PathBuf,
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,
}

fn default_file_descriptor_limit() -> u64 {
    DEFAULT_FILE_DESCRIPTOR_LIMIT
}

fn default_min_cpu_proxy() -> u32 {
    MIN_CPU_PROXY
}

fn default_max_cpu_proxy() -> u32 {
    MAX_CPU_PROXY
}

fn default_sync_interval_secs() -> u64 {
    DEFAULT_SYNC_INTERVAL_SECS
}

fn default_registry_dir() -> PathBuf {
    PathBuf::from("registry")
}

fn default_store_path() -> PathBuf {
    PathBuf::from("desired_lrps.json")
}
