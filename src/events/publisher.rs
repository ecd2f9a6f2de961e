use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::constants::defaults;
use crate::models::BundlingResult;

/// Broadcast channel carrying every computed bundling result on one topic
#[derive(Debug, Clone)]
pub struct ResultPublisher {
    topic: Arc<str>,
    sender: broadcast::Sender<PublishedResult>,
    closed: Arc<AtomicBool>,
}

/// Result as seen by a subscriber
#[derive(Debug, Clone)]
pub struct PublishedResult {
    pub topic: Arc<str>,
    pub result: Arc<BundlingResult>,
    pub published_at: chrono::DateTime<chrono::Utc>,
}

impl ResultPublisher {
    /// Create a new publisher for `topic` with the specified channel capacity
    pub fn new(topic: impl Into<String>, capacity: usize) -> Self {
        let topic: String = topic.into();
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            topic: Arc::from(topic),
            sender,
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Publish a result, returning the number of subscribers it reached
    pub fn publish(&self, result: Arc<BundlingResult>) -> Result<usize, PublishError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(PublishError::ChannelClosed);
        }

        let published = PublishedResult {
            topic: Arc::clone(&self.topic),
            result,
            published_at: chrono::Utc::now(),
        };

        // send() only fails when nobody is subscribed, which is fine for a broadcast
        match self.sender.send(published) {
            Ok(receivers) => Ok(receivers),
            Err(broadcast::error::SendError(_)) => Ok(0),
        }
    }

    /// Subscribe to results; dropping the receiver unsubscribes
    pub fn subscribe(&self) -> broadcast::Receiver<PublishedResult> {
        self.sender.subscribe()
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Refuse further publishes (shutdown)
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

/// Error types for result publishing
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PublishError {
    #[error("Result channel is closed")]
    ChannelClosed,
}

impl Default for ResultPublisher {
    fn default() -> Self {
        Self::new(defaults::RESULT_TOPIC, defaults::BROADCAST_CAPACITY)
    }
}
