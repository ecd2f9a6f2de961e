//! # Worker Health Reporting
//!
//! The worker reports one of four states to a status collaborator. A fault is
//! meant to be visible to process supervision; it never stops the worker loop.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::watch;
use tracing::{error, info, warn};

/// Health state of the bundling worker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "message", rename_all = "snake_case")]
pub enum WorkerStatus {
    /// Worker is starting up
    Initializing(String),
    /// Worker is consuming requests normally
    Ok,
    /// Worker is running but degraded (backlog, rejected orderings)
    Warning(String),
    /// The last request hit an unrecoverable planner failure
    Fault(String),
}

impl WorkerStatus {
    /// Get a human-readable description of the status
    pub fn description(&self) -> String {
        match self {
            WorkerStatus::Initializing(phase) => format!("Initializing - {phase}"),
            WorkerStatus::Ok => "Ok".to_string(),
            WorkerStatus::Warning(message) => format!("Warning - {message}"),
            WorkerStatus::Fault(message) => format!("Fault - {message}"),
        }
    }

    /// Severity of the status (0 = healthy, 10 = critical)
    pub fn severity_level(&self) -> u8 {
        match self {
            WorkerStatus::Ok => 0,
            WorkerStatus::Initializing(_) => 2,
            WorkerStatus::Warning(_) => 5,
            WorkerStatus::Fault(_) => 10,
        }
    }

    pub fn is_fault(&self) -> bool {
        matches!(self, WorkerStatus::Fault(_))
    }
}

impl fmt::Display for WorkerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description())
    }
}

/// Receives the worker's status signals.
#[async_trait]
pub trait StatusReporter: Send + Sync {
    async fn report(&self, status: WorkerStatus);
}

/// Default [`StatusReporter`]: logs transitions and keeps the latest status in
/// a watch channel so observers can await changes.
#[derive(Debug)]
pub struct StatusBoard {
    sender: watch::Sender<WorkerStatus>,
}

impl Default for StatusBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusBoard {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(WorkerStatus::Initializing("starting".to_string()));
        Self { sender }
    }

    pub fn current(&self) -> WorkerStatus {
        self.sender.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<WorkerStatus> {
        self.sender.subscribe()
    }

    /// Store `status`, logging only when it differs from the previous one.
    pub fn set(&self, status: WorkerStatus) {
        let changed = self.sender.send_if_modified(|current| {
            if *current == status {
                return false;
            }
            *current = status.clone();
            true
        });
        if !changed {
            return;
        }

        match &status {
            WorkerStatus::Fault(message) => error!(status = "fault", %message, "Worker status changed"),
            WorkerStatus::Warning(message) => warn!(status = "warning", %message, "Worker status changed"),
            WorkerStatus::Ok => info!(status = "ok", "Worker status changed"),
            WorkerStatus::Initializing(phase) => {
                info!(status = "initializing", %phase, "Worker status changed")
            }
        }
    }
}

#[async_trait]
impl StatusReporter for StatusBoard {
    async fn report(&self, status: WorkerStatus) {
        self.set(status);
    }
}
