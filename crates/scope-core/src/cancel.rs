//! Cooperative cancellation for blocking waits.

use tokio::sync::watch;

/// Clonable cancellation flag.
///
/// All clones share one flag. Once cancelled it stays cancelled; create a new
/// token for the next operation.
///
/// ```rust
/// use scope_core::cancel::CancelToken;
///
/// let token = CancelToken::new();
/// let ui_copy = token.clone();
/// ui_copy.cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Debug, Clone)]
pub struct CancelToken {
    sender: std::sync::Arc<watch::Sender<bool>>,
}

impl CancelToken {
    /// Create a token that is not cancelled.
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self {
            sender: std::sync::Arc::new(sender),
        }
    }

    /// Cancel every wait observing this token.
    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }

    /// Whether [`cancel`](Self::cancel) has been called.
    pub fn is_cancelled(&self) -> bool {
        *self.sender.borrow()
    }

    /// Resolve once the token is cancelled.
    pub async fn cancelled(&self) {
        let mut receiver = self.sender.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait.
        let _ = receiver.wait_for(|cancelled| *cancelled).await;
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}
