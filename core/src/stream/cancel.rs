//! stream/cancel.rs
//! Broadcast stop conditions checked at every blocking handoff.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crossbeam::channel::{bounded, select, Receiver, Sender};
use tracing::debug;

use crate::types::StreamError;

/// One-shot broadcast flag.
///
/// Cancelling drops the only sender of an internal channel, so every clone
/// of `signal()` becomes ready at once and can sit in a `select!` next to
/// the stage's data channel.
#[derive(Clone, Debug)]
pub struct CancelToken {
    inner: Arc<TokenInner>,
}

#[derive(Debug)]
struct TokenInner {
    cancelled: AtomicBool,
    trigger: Mutex<Option<Sender<()>>>,
    signal: Receiver<()>,
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelToken {
    pub fn new() -> Self {
        let (tx, rx) = bounded::<()>(0);
        Self {
            inner: Arc::new(TokenInner {
                cancelled: AtomicBool::new(false),
                trigger: Mutex::new(Some(tx)),
                signal: rx,
            }),
        }
    }

    /// Idempotent.
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::Release);
        let mut trigger = lock_ignoring_poison(&self.inner.trigger);
        trigger.take();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    /// Becomes permanently ready (disconnected) once cancelled.
    pub fn signal(&self) -> &Receiver<()> {
        &self.inner.signal
    }
}

/// Shared termination state for one scan.
///
/// `stop` ends the producing side (framer, decoders) when the output cap is
/// reached. `abort` ends every stage after a fatal error; aborting always
/// stops as well.
#[derive(Debug, Default)]
pub struct Shutdown {
    pub stop: CancelToken,
    pub abort: CancelToken,
    first_error: Mutex<Option<StreamError>>,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a fatal error and abort. Only the first error is kept.
    pub fn fail(&self, err: StreamError) {
        {
            let mut slot = lock_ignoring_poison(&self.first_error);
            if slot.is_none() {
                debug!(error = %err, "aborting scan");
                *slot = Some(err);
            } else {
                debug!(error = %err, "scan already aborted, dropping error");
            }
        }
        self.abort.cancel();
        self.stop.cancel();
    }

    pub fn is_aborted(&self) -> bool {
        self.abort.is_cancelled()
    }

    pub fn take_error(&self) -> Option<StreamError> {
        lock_ignoring_poison(&self.first_error).take()
    }
}

/// The receiving stage went away or the token fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cancelled;

/// Blocking send that gives up as soon as `token` fires.
pub fn send_or_cancel<T>(tx: &Sender<T>, item: T, token: &CancelToken) -> Result<(), Cancelled> {
    if token.is_cancelled() {
        return Err(Cancelled);
    }
    select! {
        send(tx, item) -> res => res.map_err(|_| Cancelled),
        recv(token.signal()) -> _ => Err(Cancelled),
    }
}

/// Blocking receive; `None` when the channel is drained and closed, or
/// when `token` fires.
pub fn recv_or_cancel<T>(rx: &Receiver<T>, token: &CancelToken) -> Option<T> {
    if token.is_cancelled() {
        return None;
    }
    select! {
        recv(rx) -> msg => msg.ok(),
        recv(token.signal()) -> _ => None,
    }
}

fn lock_ignoring_poison<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
