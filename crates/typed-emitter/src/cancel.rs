//! Cancellation signals: external capabilities that unsubscribe listeners.
//!
//! The emitter only *consumes* a [`CancellationSignal`]: it asks whether the
//! signal already fired, and otherwise registers a one-shot observer that
//! removes the listener entry. The observer's [`Unsubscribe`] handle is kept
//! on the entry and called when the entry goes away through any other path,
//! so long-lived signals do not accumulate dead observers.
//!
//! [`CancellationToken`] is the bundled implementation.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

/// An owned one-shot closure that detaches an observer when called.
pub type Unsubscribe = Box<dyn FnOnce() + Send + Sync>;

/// Closure type for cancellation observers.
pub type CancelObserver = Box<dyn FnOnce() + Send>;

/// "Is it signalled?" plus "tell me once when it is".
pub trait CancellationSignal: Send + Sync {
    /// Whether the signal has already fired.
    fn is_cancelled(&self) -> bool;

    /// Register `observer` to run exactly once when the signal fires.
    ///
    /// If the signal has already fired the observer runs immediately. The
    /// returned handle detaches the observer; calling it after the signal
    /// fired is a no-op.
    fn subscribe(&self, observer: CancelObserver) -> Unsubscribe;
}

// ============================================================================
// CancellationToken
// ============================================================================

struct TokenInner {
    cancelled: AtomicBool,
    observers: Mutex<Vec<(u64, CancelObserver)>>,
    next_id: AtomicU64,
}

/// A clonable cancellation token; every clone observes the same state.
///
/// `cancel()` is idempotent. Observers run synchronously inside the first
/// `cancel()` call, in subscription order, with the token's lock released.
#[derive(Clone)]
pub struct CancellationToken {
    inner: Arc<TokenInner>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(TokenInner {
                cancelled: AtomicBool::new(false),
                observers: Mutex::new(Vec::new()),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Fire the token. Only the first call runs observers.
    pub fn cancel(&self) {
        if self.inner.cancelled.swap(true, Ordering::AcqRel) {
            return;
        }
        let observers = std::mem::take(&mut *self.inner.observers.lock());
        tracing::trace!(observers = observers.len(), "cancellation token fired");
        for (_, observer) in observers {
            observer();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    /// Number of observers still waiting for this token to fire.
    pub fn observer_count(&self) -> usize {
        self.inner.observers.lock().len()
    }

    /// Wrap a clone of this token as a shareable signal for
    /// [`ListenerOptions::with_signal`](crate::types::ListenerOptions::with_signal).
    pub fn signal(&self) -> Arc<dyn CancellationSignal> {
        Arc::new(self.clone())
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellationToken")
            .field("cancelled", &self.is_cancelled())
            .field("observer_count", &self.observer_count())
            .finish()
    }
}

impl CancellationSignal for CancellationToken {
    fn is_cancelled(&self) -> bool {
        CancellationToken::is_cancelled(self)
    }

    fn subscribe(&self, observer: CancelObserver) -> Unsubscribe {
        {
            let mut observers = self.inner.observers.lock();
            // Checked under the lock: `cancel()` sets the flag before draining,
            // so an observer pushed here is guaranteed to be drained.
            if !self.is_cancelled() {
                let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
                observers.push((id, observer));
                let weak: Weak<TokenInner> = Arc::downgrade(&self.inner);
                return Box::new(move || {
                    if let Some(inner) = weak.upgrade() {
                        inner.observers.lock().retain(|(oid, _)| *oid != id);
                    }
                });
            }
        }
        observer();
        Box::new(|| {})
    }
}

// ============================================================================
// Tests
// ============================================================================
