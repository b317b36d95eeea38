use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{HttpRoute, Routes};

use super::ssh::{SshRoute, SSH_ROUTE_SCHEME};

pub const HTTP_ROUTE_SCHEME: &str = "cf-router";

/// Hostnames that share a container port and route service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CfRoute {
    pub hostnames: Vec<String>,
    pub port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route_service_url: Option<String>,
}

/// Group requested hostnames by (port, route service url), keeping the order
/// in which each group first appears. Routes without a port use `default_port`.
pub fn http_routes(routes: &[HttpRoute], default_port: u16) -> Vec<CfRoute> {
    let mut grouped: Vec<CfRoute> = Vec::new();
    for route in routes {
        let port = route.port.unwrap_or(default_port);
        let route_service_url = route
            .route_service_url
            .clone()
            .filter(|url| !url.is_empty());

        match grouped
            .iter_mut()
            .find(|g| g.port == port && g.route_service_url == route_service_url)
        {
            Some(group) => group.hostnames.push(route.hostname.clone()),
            None => grouped.push(CfRoute {
                hostnames: vec![route.hostname.clone()],
                port,
                route_service_url,
            }),
        }
    }
    grouped
}

/// Build the routing table: always the http scheme, plus the ssh scheme
/// when a sidecar was provisioned.
pub fn routing_table(
    routes: &[HttpRoute],
    default_port: u16,
    ssh: Option<&SshRoute>,
) -> Result<Routes> {
    let mut table = Routes::new();
    table.insert(
        HTTP_ROUTE_SCHEME.to_string(),
        serde_json::to_value(http_routes(routes, default_port))?,
    );
    if let Some(ssh) = ssh {
        table.insert(SSH_ROUTE_SCHEME.to_string(), serde_json::to_value(ssh)?);
    }
    Ok(table)
}
