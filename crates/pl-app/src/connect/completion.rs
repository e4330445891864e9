use std::fmt;

use tokio::sync::oneshot;

/// Single-use answer token carried by a host event.
///
/// `complete` consumes the token, so an event can be answered at most once
/// by construction. Dropping the token unanswered counts as a negative
/// answer on the orchestrator side.
pub struct Completion<T> {
    tx: oneshot::Sender<T>,
}

impl<T> Completion<T> {
    pub(crate) fn new() -> (Self, oneshot::Receiver<T>) {
        let (tx, rx) = oneshot::channel();
        (Self { tx }, rx)
    }

    pub fn complete(self, value: T) {
        // The flow may have moved on (cancel, retry); a late answer is
        // simply dropped.
        let _ = self.tx.send(value);
    }
}

impl<T> fmt::Debug for Completion<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Completion")
    }
}
