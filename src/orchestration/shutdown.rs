//! Process-wide cooperative shutdown signal.

use tokio::sync::watch;

/// Owner side: flips the signal once. Dropping the handle also counts as
/// shutdown for every outstanding [`ShutdownSignal`].
#[derive(Debug)]
pub struct ShutdownHandle {
    sender: watch::Sender<bool>,
}

/// Observer side, cheap to clone into every component that waits.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    receiver: watch::Receiver<bool>,
}

impl ShutdownHandle {
    pub fn channel() -> (Self, ShutdownSignal) {
        let (sender, receiver) = watch::channel(false);
        (Self { sender }, ShutdownSignal { receiver })
    }

    pub fn trigger(&self) {
        self.sender.send_replace(true);
    }

    pub fn signal(&self) -> ShutdownSignal {
        ShutdownSignal {
            receiver: self.sender.subscribe(),
        }
    }
}

impl ShutdownSignal {
    pub fn is_shutdown(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Resolves once shutdown has been triggered (immediately if it already was).
    pub async fn cancelled(&self) {
        let mut receiver = self.receiver.clone();
        // An error means the handle was dropped, which is shutdown as well
        let _ = receiver.wait_for(|stopped| *stopped).await;
    }
}
