//! Stage cancellation
//!
//! Cancelling stops a stage from waiting on its workers. Work that was already
//! dispatched keeps running to completion in the background.

use std::sync::Arc;
use tokio::sync::watch;

/// Cloneable cancellation handle shared between a caller and running stages
#[derive(Debug, Clone)]
pub struct StageCancellation {
    sender: Arc<watch::Sender<bool>>,
    receiver: watch::Receiver<bool>,
}

impl StageCancellation {
    pub fn new() -> Self {
        let (sender, receiver) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
            receiver,
        }
    }

    /// Request cancellation; every clone observes it
    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }

    /// Check if cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Resolves once cancellation has been requested
    pub async fn cancelled(&self) {
        let mut receiver = self.receiver.clone();
        // The sender lives as long as `self`, so this only returns on cancel.
        let _ = receiver.wait_for(|cancelled| *cancelled).await;
    }
}

impl Default for StageCancellation {
    fn default() -> Self {
        Self::new()
    }
}
