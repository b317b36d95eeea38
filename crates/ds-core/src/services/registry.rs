use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::{Result, SyncError};
use crate::models::DesireRequest;

pub const LISTING_BUFFER: usize = 64;

/// Where desire requests come from. `fetch` streams the full listing into
/// `tx` and returns once it is complete; an error means the listing was cut
/// short.
#[async_trait]
pub trait DesireSource: Send + Sync {
    async fn fetch(&self, tx: mpsc::Sender<DesireRequest>) -> Result<()>;
}

/// Reads one desire request per `*.yaml` file in a directory.
pub struct DirectoryRegistry {
    registry_dir: PathBuf,
}

impl DirectoryRegistry {
    pub fn new(registry_dir: &Path) -> Self {
        Self {
            registry_dir: registry_dir.to_path_buf(),
        }
    }

    async fn list(&self) -> Result<Vec<PathBuf>> {
        let dir = &self.registry_dir;
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut paths = Vec::new();
        let mut entries = tokio::fs::read_dir(dir)
            .await
            .map_err(|e| SyncError::Registry(format!("reading registry dir: {e}")))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| SyncError::Registry(format!("reading registry entry: {e}")))?
        {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("yaml") {
                paths.push(path);
            }
        }

        paths.sort();
        Ok(paths)
    }

    async fn load(path: &Path) -> Result<DesireRequest> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| SyncError::Registry(format!("reading {}: {e}", path.display())))?;
        serde_yaml::from_str(&content)
            .map_err(|e| SyncError::Registry(format!("parsing {}: {e}", path.display())))
    }
}

#[async_trait]
impl DesireSource for DirectoryRegistry {
    async fn fetch(&self, tx: mpsc::Sender<DesireRequest>) -> Result<()> {
        let paths = self.list().await?;
        tracing::debug!(count = paths.len(), dir = %self.registry_dir.display(), "fetching_desired_apps");

        for path in paths {
            let request = Self::load(&path).await?;
            if tx.send(request).await.is_err() {
                return Err(SyncError::Registry("listing consumer went away".into()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    async fn collect(registry: &DirectoryRegistry) -> (Result<()>, Vec<DesireRequest>) {
        let (tx, mut rx) = mpsc::channel(LISTING_BUFFER);
        let result = registry.fetch(tx).await;
        let mut requests = Vec::new();
        while let Some(request) = rx.recv().await {
            requests.push(request);
        }
        (result, requests)
    }

    #[tokio::test]
    async fn lists_yaml_files_in_sorted_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("b.yaml"),
            "process_guid: app-b\ndocker_image: busybox\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("a.yaml"),
            "process_guid: app-a\ndroplet_uri: http://droplet\nstack: cflinuxfs4\n",
        )
        .unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let (result, requests) = collect(&DirectoryRegistry::new(dir.path())).await;
        result.unwrap();
        let guids: Vec<&str> = requests.iter().map(|r| r.process_guid.as_str()).collect();
        assert_eq!(guids, vec!["app-a", "app-b"]);
        assert_eq!(requests[0].stack, "cflinuxfs4");
    }

    #[tokio::test]
    async fn missing_directory_is_an_empty_listing() {
        let dir = tempfile::tempdir().unwrap();
        let (result, requests) =
            collect(&DirectoryRegistry::new(&dir.path().join("missing"))).await;
        result.unwrap();
        assert!(requests.is_empty());
    }

    #[tokio::test]
    async fn invalid_file_fails_the_fetch() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.yaml"), "process_guid: app-a\n").unwrap();
        fs::write(dir.path().join("b.yaml"), "memory_mb: [not a number\n").unwrap();

        let (result, requests) = collect(&DirectoryRegistry::new(dir.path())).await;
        assert!(matches!(result, Err(SyncError::Registry(_))));
        assert_eq!(requests.len(), 1);
    }
}
