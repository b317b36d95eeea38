use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::{Result, SyncError};
use crate::models::RunSpecification;

/// The scheduler's view of what should be running.
#[async_trait]
pub trait DesiredStateStore: Send + Sync {
    /// Snapshot of every stored specification.
    async fn desired_specs(&self) -> Result<Vec<RunSpecification>>;

    /// Store a new specification. Fails if the guid is already present.
    async fn desire(&self, spec: RunSpecification) -> Result<()>;

    /// Replace an existing specification. Fails if the guid is unknown.
    async fn update(&self, spec: RunSpecification) -> Result<()>;

    /// Remove a specification. Fails if the guid is unknown.
    async fn remove(&self, process_guid: &str) -> Result<()>;
}

/// Stores specifications as a pretty-printed JSON array in one file.
pub struct FileSpecStore {
    state_file_path: PathBuf,
    lock: Mutex<()>,
}

impl FileSpecStore {
    pub fn new(state_file_path: &Path) -> Self {
        Self {
            state_file_path: state_file_path.to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    async fn load(&self) -> Result<Vec<RunSpecification>> {
        if !self.state_file_path.exists() {
            return Ok(Vec::new());
        }
        let json = tokio::fs::read_to_string(&self.state_file_path)
            .await
            .map_err(|e| SyncError::Store(format!("failed to read state file: {e}")))?;
        let specs: Vec<RunSpecification> = serde_json::from_str(&json)?;
        Ok(specs)
    }

    async fn save(&self, specs: &[RunSpecification]) -> Result<()> {
        if let Some(parent) = self.state_file_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| SyncError::Store(format!("failed to create state dir: {e}")))?;
        }
        let json = serde_json::to_string_pretty(specs)?;
        tokio::fs::write(&self.state_file_path, json)
            .await
            .map_err(|e| SyncError::Store(format!("failed to write state file: {e}")))?;
        Ok(())
    }
}

#[async_trait]
impl DesiredStateStore for FileSpecStore {
    async fn desired_specs(&self) -> Result<Vec<RunSpecification>> {
        let _guard = self.lock.lock().await;
        self.load().await
    }

    async fn desire(&self, spec: RunSpecification) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut specs = self.load().await?;
        if specs.iter().any(|s| s.process_guid == spec.process_guid) {
            return Err(SyncError::Store(format!(
                "'{}' is already desired",
                spec.process_guid
            )));
        }
        specs.push(spec);
        self.save(&specs).await
    }

    async fn update(&self, spec: RunSpecification) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut specs = self.load().await?;
        let slot = specs
            .iter_mut()
            .find(|s| s.process_guid == spec.process_guid)
            .ok_or_else(|| SyncError::Store(format!("'{}' is not desired", spec.process_guid)))?;
        *slot = spec;
        self.save(&specs).await
    }

    async fn remove(&self, process_guid: &str) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut specs = self.load().await?;
        let before = specs.len();
        specs.retain(|s| s.process_guid != process_guid);
        if specs.len() == before {
            return Err(SyncError::Store(format!("'{process_guid}' is not desired")));
        }
        self.save(&specs).await
    }
}
