//! A small watch-channel-backed cancellation token.
//!
//! Clones observe the same signal. The serve loop and pending bundle waits
//! race against [`CancelToken::cancelled`]; firing the token makes
//! `serve` return [`OscError::Canceled`](crate::OscError::Canceled).

use std::sync::Arc;

use tokio::sync::watch;

/// A cloneable one-shot cancellation signal.
#[derive(Debug, Clone)]
pub struct CancelToken {
    tx: Arc<watch::Sender<bool>>,
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    /// Creates a token in the not-cancelled state.
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            tx: Arc::new(tx),
            rx,
        }
    }

    /// Fires the signal. Idempotent.
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }

    /// Whether the signal has fired.
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once the signal fires. Resolves immediately if it already
    /// has.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        // The sender lives inside self, so wait_for can only fail if the
        // token itself is gone.
        let _ = rx.wait_for(|&cancelled| cancelled).await;
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}
