use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::action::Action;
use super::desire::{EnvironmentVariable, SecurityGroupRule};

/// Routing metadata keyed by routing scheme name.
pub type Routes = BTreeMap<String, serde_json::Value>;

/// The compiled, scheduler-ready description of one instance group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSpecification {
    pub process_guid: String,
    pub domain: String,
    pub instances: u32,
    pub cpu_weight: u32,
    pub root_fs: String,
    pub memory_mb: u32,
    pub disk_mb: u32,
    pub ports: Vec<u16>,
    pub privileged: bool,
    pub start_timeout_secs: u32,
    pub log_guid: String,
    pub log_source: String,
    pub metrics_guid: String,
    #[serde(default)]
    pub routes: Routes,
    #[serde(default)]
    pub egress_rules: Vec<SecurityGroupRule>,
    /// Version tag copied from the desire request; the differ compares on it.
    pub annotation: String,
    pub setup: Action,
    pub action: Action,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monitor: Option<Action>,
    #[serde(default)]
    pub environment_variables: Vec<EnvironmentVariable>,
}
