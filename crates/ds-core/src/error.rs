use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("multiple app sources specified: set either a docker image or a droplet uri")]
    MultipleAppSources,

    #[error("docker image url is missing")]
    DockerImageMissing,

    #[error("droplet uri is missing")]
    DropletSourceMissing,

    #[error("no lifecycle defined for '{0}'")]
    NoLifecycleDefined(String),

    #[error("invalid docker image reference '{reference}': {reason}")]
    InvalidDockerImage { reference: String, reason: String },

    #[error("failed to parse execution metadata: {0}")]
    ExecutionMetadata(String),

    #[error("no tcp ports found in image metadata")]
    NoTcpPorts,

    #[error("key generation failed: {0}")]
    KeyGeneration(String),

    #[error("config file not found at {0}")]
    ConfigNotFound(PathBuf),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("desired state store failed: {0}")]
    Store(String),

    #[error("registry fetch failed: {0}")]
    Registry(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, SyncError>;
