pub mod action;
pub mod change;
pub mod config;
pub mod desire;
pub mod run_spec;

pub use action::{Action, DownloadAction, ResourceLimits, RunAction};
pub use change::ChangeEvent;
pub use config::SyncConfig;
pub use desire::{
    DesireRequest, EnvironmentVariable, HealthCheckType, HttpRoute, IcmpInfo, PortRange,
    RoutingInfo, SecurityGroupRule,
};
pub use run_spec::{Routes, RunSpecification};
