//! Single-assignment completion.

use tokio::sync::oneshot;

/// Wraps a caller's completion so it fires at most once.
///
/// The first `fire` delivers the value; later calls are no-ops and report
/// `false`, so racing paths can all call it and still run their own
/// housekeeping.
#[derive(Debug)]
pub struct CompletionLatch<T> {
    sender: Option<oneshot::Sender<T>>,
}

impl<T> CompletionLatch<T> {
    pub fn new(sender: oneshot::Sender<T>) -> Self {
        Self {
            sender: Some(sender),
        }
    }

    /// Create a latch along with the receiver the caller awaits.
    pub fn channel() -> (Self, oneshot::Receiver<T>) {
        let (tx, rx) = oneshot::channel();
        (Self::new(tx), rx)
    }

    /// Deliver `value` if nothing was delivered yet. Returns whether this
    /// call was the one that fired.
    ///
    /// A caller that stopped listening still counts as fired.
    pub fn fire(&mut self, value: T) -> bool {
        match self.sender.take() {
            Some(sender) => {
                let _ = sender.send(value);
                true
            }
            None => false,
        }
    }

    pub fn is_fired(&self) -> bool {
        self.sender.is_none()
    }
}
