//! One-shot bridge from callback-style platform APIs to blocking calls
//!
//! [`oneshot`] returns a [`Completer`] that is turned into the platform
//! completion callback, and a [`Pending`] that the calling thread blocks on.
//! Exactly one producer and one consumer exist per bridge.

use crate::telephony::Completion;
use std::sync::mpsc::{sync_channel, Receiver, RecvTimeoutError, SyncSender};
use std::time::Duration;

/// Why a wait ended without a value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitError {
    /// The bound elapsed before the producer completed
    TimedOut,
    /// The producer was dropped without completing
    Dropped,
}

/// Producer half; completing consumes it so a value is set at most once
pub struct Completer<T> {
    tx: SyncSender<T>,
}

/// Consumer half
pub struct Pending<T> {
    rx: Receiver<T>,
}

/// Create a connected completer/pending pair
pub fn oneshot<T: Send + 'static>() -> (Completer<T>, Pending<T>) {
    let (tx, rx) = sync_channel(1);
    (Completer { tx }, Pending { rx })
}

impl<T: Send + 'static> Completer<T> {
    /// Deliver the value
    ///
    /// A consumer that already gave up is not an error for the producer;
    /// the value is discarded.
    pub fn complete(self, value: T) {
        if self.tx.try_send(value).is_err() {
            tracing::trace!("completion arrived after the waiter gave up");
        }
    }

    /// Wrap this completer into a platform completion callback
    pub fn into_callback(self) -> Completion<T> {
        Box::new(move |value| self.complete(value))
    }
}

impl<T> Pending<T> {
    /// Block until the value arrives, the producer is dropped, or `timeout`
    /// elapses
    pub fn wait(self, timeout: Duration) -> Result<T, WaitError> {
        match self.rx.recv_timeout(timeout) {
            Ok(value) => Ok(value),
            Err(RecvTimeoutError::Timeout) => Err(WaitError::TimedOut),
            Err(RecvTimeoutError::Disconnected) => Err(WaitError::Dropped),
        }
    }
}

/// Issue a callback-style call and block until it completes
///
/// `issue` receives the completion callback and must hand it to the
/// platform.
pub fn call_blocking<T, F>(timeout: Duration, issue: F) -> Result<T, WaitError>
where
    T: Send + 'static,
    F: FnOnce(Completion<T>),
{
    let (completer, pending) = oneshot();
    issue(completer.into_callback());
    pending.wait(timeout)
}
