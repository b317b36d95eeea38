use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};

use crate::error::{Result, SyncError};
use crate::models::{ChangeEvent, DesireRequest, RunSpecification};

use super::differ;
use super::recipe_builder::RecipeBuilders;
use super::registry::{DesireSource, LISTING_BUFFER};
use super::spec_store::DesiredStateStore;

/// One application that could not be reconciled during a pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncFailure {
    pub process_guid: String,
    pub error: String,
}

/// Outcome of one reconciliation pass.
#[derive(Debug, Clone, Serialize)]
pub struct SyncSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    pub failures: Vec<SyncFailure>,
}

impl SyncSummary {
    fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            finished_at: started_at,
            created: 0,
            updated: 0,
            deleted: 0,
            failures: Vec::new(),
        }
    }

    fn fail(&mut self, process_guid: &str, error: &SyncError) {
        self.failures.push(SyncFailure {
            process_guid: process_guid.to_string(),
            error: error.to_string(),
        });
    }
}

/// Brings the desired state store in line with the registry.
pub struct BulkProcessor {
    store: Arc<dyn DesiredStateStore>,
    source: Arc<dyn DesireSource>,
    builders: Arc<RecipeBuilders>,
}

impl BulkProcessor {
    pub fn new(
        store: Arc<dyn DesiredStateStore>,
        source: Arc<dyn DesireSource>,
        builders: RecipeBuilders,
    ) -> Self {
        Self {
            store,
            source,
            builders: Arc::new(builders),
        }
    }

    /// Run one full pass. Creates and updates are applied as the differ
    /// finds them; deletes wait until the listing is known to be complete.
    pub async fn sync_once(&self) -> Result<SyncSummary> {
        let mut summary = SyncSummary::new(Utc::now());
        let existing = self.store.desired_specs().await?;
        tracing::debug!(existing = existing.len(), "sync_pass_started");

        let (tx, rx) = mpsc::channel(LISTING_BUFFER);
        let source = Arc::clone(&self.source);
        let fetch = tokio::spawn(async move { source.fetch(tx).await });

        let mut changes = differ::diff(&existing, rx);
        let mut deletes = Vec::new();
        while let Some(change) = changes.recv().await {
            match change {
                ChangeEvent::Create(request) => {
                    if self.apply_create(&request, &mut summary).await {
                        summary.created += 1;
                    }
                }
                ChangeEvent::Update(request) => {
                    if self.apply_update(&request, &mut summary).await {
                        summary.updated += 1;
                    }
                }
                ChangeEvent::Delete(guid) => deletes.push(guid),
            }
        }

        let fetched = fetch
            .await
            .unwrap_or_else(|e| Err(SyncError::Registry(format!("fetch task failed: {e}"))));
        if let Err(e) = fetched {
            tracing::error!(error = %e, skipped_deletes = deletes.len(), "fetching_desired_apps_failed");
            return Err(match e {
                SyncError::Registry(_) => e,
                other => SyncError::Registry(other.to_string()),
            });
        }

        for guid in deletes {
            match self.store.remove(&guid).await {
                Ok(()) => {
                    tracing::info!(process_guid = %guid, "removed_desired_lrp");
                    summary.deleted += 1;
                }
                Err(e) => {
                    tracing::error!(process_guid = %guid, error = %e, "removing_desired_lrp_failed");
                    summary.fail(&guid, &e);
                }
            }
        }

        summary.finished_at = Utc::now();
        tracing::info!(
            created = summary.created,
            updated = summary.updated,
            deleted = summary.deleted,
            failed = summary.failures.len(),
            "sync_pass_complete"
        );
        Ok(summary)
    }

    /// Repeat [`Self::sync_once`] every `period` until `shutdown` resolves.
    /// A pass that is running when the signal fires is allowed to finish.
    pub async fn run(&self, period: Duration, shutdown: impl Future<Output = ()>) {
        tokio::pin!(shutdown);
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(interval_secs = period.as_secs(), "bulk_sync_started");
        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = ticker.tick() => {
                    if let Err(e) = self.sync_once().await {
                        tracing::error!(error = %e, "sync_pass_failed");
                    }
                }
            }
        }
        tracing::info!("bulk_sync_stopped");
    }

    /// Compile a request. Requests that generate ssh keys are built on the
    /// blocking pool since key generation may wait on the entropy source.
    async fn build(&self, request: &DesireRequest) -> Result<RunSpecification> {
        if !request.allow_ssh {
            return self.builders.for_request(request).build(request);
        }
        let builders = Arc::clone(&self.builders);
        let request = request.clone();
        tokio::task::spawn_blocking(move || builders.for_request(&request).build(&request))
            .await
            .unwrap_or_else(|e| Err(SyncError::KeyGeneration(format!("build task failed: {e}"))))
    }

    async fn apply_create(&self, request: &DesireRequest, summary: &mut SyncSummary) -> bool {
        let guid = request.process_guid.as_str();
        let spec = match self.build(request).await {
            Ok(spec) => spec,
            Err(e) => {
                tracing::error!(process_guid = %guid, error = %e, "building_run_spec_failed");
                summary.fail(guid, &e);
                return false;
            }
        };
        match self.store.desire(spec).await {
            Ok(()) => {
                tracing::info!(process_guid = %guid, "desired_lrp_created");
                true
            }
            Err(e) => {
                tracing::error!(process_guid = %guid, error = %e, "creating_desired_lrp_failed");
                summary.fail(guid, &e);
                false
            }
        }
    }

    async fn apply_update(&self, request: &DesireRequest, summary: &mut SyncSummary) -> bool {
        let guid = request.process_guid.as_str();
        let spec = match self.build(request).await {
            Ok(spec) => spec,
            Err(e) => {
                tracing::error!(process_guid = %guid, error = %e, "building_run_spec_failed");
                summary.fail(guid, &e);
                return false;
            }
        };
        match self.store.update(spec).await {
            Ok(()) => {
                tracing::info!(process_guid = %guid, "desired_lrp_updated");
                true
            }
            Err(e) => {
                tracing::error!(process_guid = %guid, error = %e, "updating_desired_lrp_failed");
                summary.fail(guid, &e);
                false
            }
        }
    }
}
