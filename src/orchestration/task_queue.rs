//! Bounded FIFO of bundling requests: many producers, one consumer.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;

use crate::error::{BundlerError, Result};
use crate::models::BundlingRequest;

#[derive(Debug)]
struct QueueState {
    requests: VecDeque<BundlingRequest>,
    closed: bool,
}

/// Bounded request queue. Pushes never block; a full queue rejects the push.
#[derive(Debug)]
pub struct BundlingQueue {
    inner: Mutex<QueueState>,
    available: Notify,
    capacity: usize,
}

impl BundlingQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(QueueState {
                requests: VecDeque::with_capacity(capacity),
                closed: false,
            }),
            available: Notify::new(),
            capacity,
        }
    }

    /// Enqueue `request` and return how many requests are ahead of it.
    pub fn push(&self, request: BundlingRequest) -> Result<usize> {
        let ahead = {
            let mut state = self.inner.lock();
            if state.closed {
                return Err(BundlerError::QueueClosed);
            }
            if state.requests.len() >= self.capacity {
                return Err(BundlerError::QueueFull {
                    capacity: self.capacity,
                });
            }
            let ahead = state.requests.len();
            state.requests.push_back(request);
            ahead
        };
        self.available.notify_one();
        Ok(ahead)
    }

    pub fn try_pop(&self) -> Option<BundlingRequest> {
        self.inner.lock().requests.pop_front()
    }

    /// Wait up to `wait` for the next request. `None` means the wait ran out or
    /// the queue is closed and drained.
    pub async fn pop_next(&self, wait: Duration) -> Option<BundlingRequest> {
        let deadline = Instant::now() + wait;
        loop {
            {
                let mut state = self.inner.lock();
                if let Some(request) = state.requests.pop_front() {
                    return Some(request);
                }
                if state.closed {
                    return None;
                }
            }
            // notify_one leaves a permit behind, so a push between the check
            // above and this await still wakes us
            if tokio::time::timeout_at(deadline, self.available.notified())
                .await
                .is_err()
            {
                return self.try_pop();
            }
        }
    }

    /// Stop accepting pushes; queued requests can still be popped.
    pub fn close(&self) {
        self.inner.lock().closed = true;
        self.available.notify_one();
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }

    pub fn len(&self) -> usize {
        self.inner.lock().requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
