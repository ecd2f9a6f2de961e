//! Request and result envelopes exchanged with requesters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::bundle::BundleList;
use super::task::{Pose2d, TaskList};
use crate::orchestration::result_distributor::ReplyDestination;

/// Identity of the agent asking for bundles; keys the pull cache.
pub type RequesterId = String;

fn generate_request_id() -> String {
    Uuid::new_v4().to_string()
}

/// One bundling job: interleave up to `max_bundle_size` of `candidates` into
/// `committed` and return the `max_bundles` cheapest orderings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundlingRequest {
    #[serde(default = "generate_request_id")]
    pub id: String,
    pub sender: RequesterId,
    pub start: Pose2d,
    #[serde(default)]
    pub committed: TaskList,
    #[serde(default)]
    pub candidates: TaskList,
    pub max_bundle_size: usize,
    pub max_bundles: usize,
    /// Direct callback for the result, if the requester provided one
    #[serde(skip)]
    pub reply_to: Option<ReplyDestination>,
}

impl BundlingRequest {
    /// Create a request with a generated id, no tasks, and limits of one bundle
    /// of one new task.
    pub fn new(sender: impl Into<RequesterId>, start: Pose2d) -> Self {
        Self {
            id: generate_request_id(),
            sender: sender.into(),
            start,
            committed: Vec::new(),
            candidates: Vec::new(),
            max_bundle_size: 1,
            max_bundles: 1,
            reply_to: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_committed(mut self, committed: TaskList) -> Self {
        self.committed = committed;
        self
    }

    pub fn with_candidates(mut self, candidates: TaskList) -> Self {
        self.candidates = candidates;
        self
    }

    pub fn with_limits(mut self, max_bundle_size: usize, max_bundles: usize) -> Self {
        self.max_bundle_size = max_bundle_size;
        self.max_bundles = max_bundles;
        self
    }

    pub fn with_reply_to(mut self, destination: ReplyDestination) -> Self {
        self.reply_to = Some(destination);
        self
    }
}

/// Best bundles for one request, cheapest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundlingResult {
    pub request_id: String,
    pub sender: RequesterId,
    pub bundles: BundleList,
    pub computed_at: DateTime<Utc>,
}

impl BundlingResult {
    pub fn new(request: &BundlingRequest, bundles: BundleList) -> Self {
        Self {
            request_id: request.id.clone(),
            sender: request.sender.clone(),
            bundles,
            computed_at: Utc::now(),
        }
    }

    pub fn best(&self) -> Option<&crate::models::Bundle> {
        self.bundles.first()
    }
}
