use anyhow::Result;
use tracing::{info, warn};

use crate::store::PlanStore;

use super::{engine::LiveSession, snapshot::SnapshotStore};

/// Rebuild the session a snapshot points at, consuming the snapshot.
///
/// A snapshot whose task has since disappeared (its plan was deleted) is
/// removed and `None` is returned.
pub async fn resume(
    plans: &PlanStore,
    snapshots: &SnapshotStore,
    rest_period: u32,
) -> Result<Option<LiveSession>> {
    let Some(snapshot) = snapshots.load()? else {
        return Ok(None);
    };

    let Some(task) = plans.find_task(&snapshot.task_id).await? else {
        warn!(task_id = %snapshot.task_id, "discarding snapshot for a task that no longer exists");
        snapshots.clear()?;
        return Ok(None);
    };

    info!(task_id = %task.id, saved_at = %snapshot.saved_at, "resuming session");
    let mut session = LiveSession::new(task, plans.clone(), snapshots.clone(), rest_period);
    session.restore(snapshot);
    snapshots.clear()?;
    Ok(Some(session))
}

/// Drop any pending snapshot. Returns whether there was one.
pub fn discard(snapshots: &SnapshotStore) -> Result<bool> {
    let removed = snapshots.clear()?;
    if removed {
        info!(path = %snapshots.path().display(), "discarded session snapshot");
    }
    Ok(removed)
}
