use serde::Deserialize;

use crate::error::{Result, SyncError};

use super::recipe_builder::DEFAULT_PORT;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Tcp,
    Udp,
}

/// A port the image declares in its metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ExposedPort {
    #[serde(rename = "Port", alias = "port")]
    pub port: u16,
    #[serde(rename = "Protocol", alias = "protocol")]
    pub protocol: Protocol,
}

/// The parts of an image's execution metadata that shape the run specification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ExecutionMetadata {
    #[serde(default)]
    pub ports: Vec<ExposedPort>,
    #[serde(default)]
    pub user: Option<String>,
}

/// Parse an execution metadata blob. An empty blob is the same as `{}`.
pub fn parse(blob: &str) -> Result<ExecutionMetadata> {
    if blob.trim().is_empty() {
        return Ok(ExecutionMetadata::default());
    }
    serde_json::from_str(blob).map_err(|e| SyncError::ExecutionMetadata(e.to_string()))
}

impl ExecutionMetadata {
    /// The user the image wants its processes to run as, if it names one.
    pub fn user(&self) -> Option<&str> {
        self.user.as_deref().filter(|u| !u.is_empty())
    }

    /// TCP ports in the order the image declares them.
    pub fn tcp_ports(&self) -> Vec<u16> {
        self.ports
            .iter()
            .filter(|p| p.protocol == Protocol::Tcp)
            .map(|p| p.port)
            .collect()
    }

    /// Ports to expose when the request does not list its own.
    ///
    /// No declared ports at all falls back to the default port; declared
    /// ports without a single tcp entry are an error.
    pub fn exposed_ports(&self) -> Result<Vec<u16>> {
        if self.ports.is_empty() {
            return Ok(vec![DEFAULT_PORT]);
        }
        let tcp = self.tcp_ports();
        if tcp.is_empty() {
            return Err(SyncError::NoTcpPorts);
        }
        Ok(tcp)
    }
}
