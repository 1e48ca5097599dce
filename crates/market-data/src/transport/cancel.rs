use std::sync::Arc;

use tokio::sync::watch;

/// Cooperative cancellation handle.
///
/// Clones share state: cancelling any clone cancels all of them. Once fired
/// the signal stays fired.
#[derive(Clone, Debug)]
pub struct CancelSignal {
    sender: Arc<watch::Sender<bool>>,
}

impl CancelSignal {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Signal for callers that never cancel.
    pub fn never() -> Self {
        Self::new()
    }

    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.sender.borrow()
    }

    /// Resolves once the signal fires. Pending forever otherwise.
    pub async fn cancelled(&self) {
        let mut receiver = self.sender.subscribe();
        if receiver.wait_for(|fired| *fired).await.is_err() {
            // Sender gone: the signal can no longer fire.
            std::future::pending::<()>().await;
        }
    }
}

impl Default for CancelSignal {
    fn default() -> Self {
        Self::new()
    }
}
