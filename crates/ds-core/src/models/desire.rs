use serde::{Deserialize, Serialize};

/// A single environment variable handed to the application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentVariable {
    pub name: String,
    pub value: String,
}

impl EnvironmentVariable {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Health check policy requested by the registry.
///
/// An empty or absent value deserializes to `Unspecified`, which is treated
/// like `Port` for callers that predate the field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthCheckType {
    #[serde(rename = "port")]
    Port,
    #[serde(rename = "none")]
    None,
    #[default]
    #[serde(rename = "")]
    Unspecified,
}

/// One hostname the application should be reachable under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpRoute {
    pub hostname: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route_service_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

impl HttpRoute {
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            route_service_url: None,
            port: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingInfo {
    #[serde(default)]
    pub http_routes: Vec<HttpRoute>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortRange {
    pub start: u16,
    pub end: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IcmpInfo {
    #[serde(rename = "type")]
    pub icmp_type: i32,
    pub code: i32,
}

/// Security group egress rule, passed through to the run specification untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityGroupRule {
    pub protocol: String,
    #[serde(default)]
    pub destinations: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port_range: Option<PortRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icmp_info: Option<IcmpInfo>,
    #[serde(default)]
    pub log: bool,
}

/// The registry's declaration that an application should be running.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesireRequest {
    pub process_guid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub droplet_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docker_image: Option<String>,
    #[serde(default)]
    pub stack: String,
    #[serde(default)]
    pub start_command: String,
    #[serde(default)]
    pub execution_metadata: String,
    #[serde(default)]
    pub environment: Vec<EnvironmentVariable>,
    #[serde(default)]
    pub memory_mb: u32,
    #[serde(default)]
    pub disk_mb: u32,
    #[serde(default)]
    pub file_descriptors: u64,
    #[serde(default)]
    pub num_instances: u32,
    #[serde(default)]
    pub routing_info: RoutingInfo,
    #[serde(default)]
    pub log_guid: String,
    #[serde(default)]
    pub health_check_type: HealthCheckType,
    #[serde(default)]
    pub health_check_timeout_in_seconds: u32,
    #[serde(default)]
    pub egress_rules: Vec<SecurityGroupRule>,
    #[serde(default)]
    pub etag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ports: Option<Vec<u16>>,
    #[serde(default)]
    pub allow_ssh: bool,
}

impl DesireRequest {
    /// The docker image reference, if one is set and non-empty.
    pub fn docker_image(&self) -> Option<&str> {
        non_empty(self.docker_image.as_deref())
    }

    /// The droplet uri, if one is set and non-empty.
    pub fn droplet_uri(&self) -> Option<&str> {
        non_empty(self.droplet_uri.as_deref())
    }

    /// The explicit port list, treating an empty list as absent.
    pub fn explicit_ports(&self) -> Option<&[u16]> {
        self.ports.as_deref().filter(|p| !p.is_empty())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_minimal_request() {
        let yaml = "process_guid: app-1\ndocker_image: busybox\n";
        let request: DesireRequest = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(request.process_guid, "app-1");
        assert_eq!(request.docker_image(), Some("busybox"));
        assert_eq!(request.droplet_uri(), None);
        assert_eq!(request.health_check_type, HealthCheckType::Unspecified);
        assert!(request.ports.is_none());
        assert!(!request.allow_ssh);
    }

    #[test]
    fn empty_sources_count_as_missing() {
        let yaml = "process_guid: app-1\ndocker_image: \"\"\ndroplet_uri: \"\"\n";
        let request: DesireRequest = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(request.docker_image(), None);
        assert_eq!(request.droplet_uri(), None);
    }

    #[test]
    fn empty_port_list_is_not_explicit() {
        let yaml = "process_guid: app-1\nports: []\n";
        let request: DesireRequest = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(request.ports.as_deref(), Some(&[][..]));
        assert!(request.explicit_ports().is_none());
    }

    #[test]
    fn health_check_type_wire_values() {
        let parse = |s: &str| serde_json::from_str::<HealthCheckType>(s).unwrap();
        assert_eq!(parse("\"port\""), HealthCheckType::Port);
        assert_eq!(parse("\"none\""), HealthCheckType::None);
        assert_eq!(parse("\"\""), HealthCheckType::Unspecified);
    }
}
