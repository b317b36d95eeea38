use std::collections::{HashMap, HashSet};

use tokio::sync::mpsc;

use crate::models::{ChangeEvent, DesireRequest, RunSpecification};

pub const CHANGE_BUFFER: usize = 64;

/// Mark-and-sweep comparison of the stored specifications against the
/// registry listing streamed through `incoming`.
///
/// Creates and updates are emitted as requests arrive; deletes only after
/// `incoming` closes, for every stored guid the listing never mentioned.
/// A guid listed more than once yields at most one event; repeats are skipped.
/// If the returned receiver is dropped the task keeps draining `incoming`
/// so the producer can always finish.
pub fn diff(
    existing: &[RunSpecification],
    mut incoming: mpsc::Receiver<DesireRequest>,
) -> mpsc::Receiver<ChangeEvent> {
    let mut remaining: HashMap<String, String> = existing
        .iter()
        .map(|spec| (spec.process_guid.clone(), spec.annotation.clone()))
        .collect();
    let (tx, rx) = mpsc::channel(CHANGE_BUFFER);

    tokio::spawn(async move {
        let mut consumer_gone = false;
        let mut seen: HashSet<String> = HashSet::new();

        while let Some(request) = incoming.recv().await {
            if consumer_gone {
                continue;
            }
            if !seen.insert(request.process_guid.clone()) {
                tracing::debug!(process_guid = %request.process_guid, "duplicate_desire_request_skipped");
                continue;
            }
            let event = match remaining.remove(&request.process_guid) {
                None => Some(ChangeEvent::Create(request)),
                Some(annotation) if annotation != request.etag => {
                    Some(ChangeEvent::Update(request))
                }
                Some(_) => None,
            };
            if let Some(event) = event {
                if tx.send(event).await.is_err() {
                    tracing::debug!("change_consumer_dropped");
                    consumer_gone = true;
                }
            }
        }

        if consumer_gone {
            return;
        }

        let mut stale: Vec<String> = remaining.into_keys().collect();
        stale.sort();
        for guid in stale {
            if tx.send(ChangeEvent::Delete(guid)).await.is_err() {
                tracing::debug!("change_consumer_dropped");
                return;
            }
        }
    });

    rx
}
