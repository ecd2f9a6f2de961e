//! # Result Distribution
//!
//! Every finished result goes out three ways: to the request's direct reply
//! destination (if any), into the per-requester pull cache, and onto the
//! broadcast topic. Only the cache write is guaranteed; reply and broadcast
//! failures are logged and reported back to the worker, never retried.
//!
//! The cache holds the latest result per requester with an unread flag. A pull
//! clears the flag; [`ResultDistributor::sweep`] evicts entries nobody pulled
//! since their last write.

use async_trait::async_trait;
use dashmap::DashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::constants::operations;
use crate::error::{BundlerError, Result};
use crate::events::{PublishError, ResultPublisher};
use crate::models::{BundlingResult, RequesterId};

/// Direct callback for a requester.
#[async_trait]
pub trait ResultConsumer: Send + Sync {
    /// Deliver `result`; an unreachable consumer returns a `RemoteCall` error.
    async fn deliver(&self, result: Arc<BundlingResult>) -> Result<()>;
}

/// Reply destination attached to a request.
#[derive(Clone)]
pub struct ReplyDestination(Arc<dyn ResultConsumer>);

impl ReplyDestination {
    pub fn new(consumer: Arc<dyn ResultConsumer>) -> Self {
        Self(consumer)
    }

    pub async fn deliver(&self, result: Arc<BundlingResult>) -> Result<()> {
        self.0.deliver(result).await
    }
}

impl fmt::Debug for ReplyDestination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ReplyDestination(..)")
    }
}

/// Publish side of the result topic.
pub trait ResultBroadcaster: Send + Sync {
    /// Returns the number of subscribers reached.
    fn broadcast(&self, result: Arc<BundlingResult>) -> std::result::Result<usize, PublishError>;
}

impl ResultBroadcaster for ResultPublisher {
    fn broadcast(&self, result: Arc<BundlingResult>) -> std::result::Result<usize, PublishError> {
        self.publish(result)
    }
}

#[derive(Debug, Clone)]
struct CachedResult {
    result: Arc<BundlingResult>,
    unread: bool,
}

/// What happened to one result on its way out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeliveryReport {
    /// `None` when the request carried no reply destination
    pub reply_delivered: Option<bool>,
    /// `None` when the broadcast failed
    pub broadcast_receivers: Option<usize>,
}

impl DeliveryReport {
    pub fn reply_failed(&self) -> bool {
        self.reply_delivered == Some(false)
    }
}

pub struct ResultDistributor {
    cache: DashMap<RequesterId, CachedResult>,
    broadcaster: Arc<dyn ResultBroadcaster>,
}

impl fmt::Debug for ResultDistributor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultDistributor")
            .field("cached", &self.cache.len())
            .finish_non_exhaustive()
    }
}

impl ResultDistributor {
    pub fn new(broadcaster: Arc<dyn ResultBroadcaster>) -> Self {
        Self {
            cache: DashMap::new(),
            broadcaster,
        }
    }

    /// Send `result` to every destination.
    pub async fn distribute(
        &self,
        result: BundlingResult,
        reply_to: Option<&ReplyDestination>,
    ) -> DeliveryReport {
        let result = Arc::new(result);
        let mut report = DeliveryReport::default();

        if let Some(destination) = reply_to {
            match destination.deliver(Arc::clone(&result)).await {
                Ok(()) => report.reply_delivered = Some(true),
                Err(e) => {
                    warn!(
                        request_id = %result.request_id,
                        sender = %result.sender,
                        error = %e,
                        "Could not reach reply destination"
                    );
                    report.reply_delivered = Some(false);
                }
            }
        }

        self.cache.insert(
            result.sender.clone(),
            CachedResult {
                result: Arc::clone(&result),
                unread: true,
            },
        );

        match self.broadcaster.broadcast(Arc::clone(&result)) {
            Ok(receivers) => {
                debug!(
                    operation = operations::RESULT_DELIVERED,
                    request_id = %result.request_id,
                    receivers = receivers,
                    "Result broadcast"
                );
                report.broadcast_receivers = Some(receivers);
            }
            Err(e) => {
                warn!(request_id = %result.request_id, error = %e, "Broadcasting result failed");
            }
        }

        report
    }

    /// Latest result for `requester`, marking it read.
    pub fn get_latest(&self, requester: &str) -> Result<Arc<BundlingResult>> {
        let mut entry =
            self.cache
                .get_mut(requester)
                .ok_or_else(|| BundlerError::NotYetAvailable {
                    requester: requester.to_string(),
                })?;
        entry.unread = false;
        Ok(Arc::clone(&entry.result))
    }

    /// Evict every entry not read since its last write; returns how many went.
    pub fn sweep(&self) -> usize {
        // Collect first so no shard lock is held while removing
        let stale: Vec<RequesterId> = self
            .cache
            .iter()
            .filter(|entry| entry.unread)
            .map(|entry| entry.key().clone())
            .collect();

        let removed = stale
            .iter()
            .filter(|key| self.cache.remove_if(*key, |_, cached| cached.unread).is_some())
            .count();

        if removed > 0 {
            info!(removed = removed, remaining = self.cache.len(), "Swept unread results");
        }
        removed
    }

    pub fn cached_requesters(&self) -> usize {
        self.cache.len()
    }
}
