//! Single-slot store for the planner's latest answer.

use parking_lot::Mutex;
use tokio::sync::Notify;
use tracing::debug;
use uuid::Uuid;

use super::PlannedPath;

/// Holds at most one [`PlannedPath`]; a newer answer replaces an unread one.
#[derive(Debug, Default)]
pub struct PathStore {
    slot: Mutex<Option<PlannedPath>>,
    updated: Notify,
}

impl PathStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called by the planner side when a path has been computed
    pub fn set(&self, path: PlannedPath) {
        *self.slot.lock() = Some(path);
        self.updated.notify_one();
    }

    pub fn take(&self) -> Option<PlannedPath> {
        self.slot.lock().take()
    }

    pub fn clear(&self) {
        self.slot.lock().take();
    }

    pub fn is_empty(&self) -> bool {
        self.slot.lock().is_none()
    }

    /// Wait until the answer for `job_id` arrives. Answers for other jobs are
    /// late replies to abandoned waits and are dropped.
    pub async fn wait_for(&self, job_id: Uuid) -> PlannedPath {
        loop {
            if let Some(path) = self.take() {
                if path.job_id == job_id {
                    return path;
                }
                debug!(
                    expected = %job_id,
                    received = %path.job_id,
                    "Discarding stale path planner answer"
                );
            }
            self.updated.notified().await;
        }
    }
}
