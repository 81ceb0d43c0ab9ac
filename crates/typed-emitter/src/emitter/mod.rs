//! Emitter<K, T>: a typed, synchronous, re-entrant pub/sub registry.
//!
//! Listeners are registered per key through [`Listener`] handles (whose
//! allocation is their identity) and catch-all [`AnyListener`]s see every
//! emission that reaches at least one of the key's own listeners. Dispatch
//! semantics:
//!   - Emitting on a key with no listeners does nothing at all.
//!   - Snapshot-on-emit: a listener added *during* emission is NOT called
//!     until the next emit.
//!   - Live re-check: a snapshotted listener removed before its turn (by
//!     `off`, by another listener, or by its cancellation signal firing) is
//!     skipped.
//!   - `once` listeners are removed right after their first call, even if
//!     the call panicked.
//!   - Per-key listeners run in registration order, then catch-alls in
//!     registration order.
//!
//! All methods take `&self` (interior mutability via `parking_lot::Mutex`).
//! The lock is never held while a callback runs, so listeners can call
//! `on()`/`off()`/`emit()` on the same emitter without deadlocking.
//!
//! Panics inside a listener propagate out of `emit()` by default, skipping
//! the rest of the pass. See [`PanicPolicy`] for the isolating alternative
//! and [`Emitter::try_emit`] for a `Result`-returning variant.

mod state;

use std::any::Any;
use std::fmt::Debug;
use std::hash::Hash;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::cancel::Unsubscribe;
use crate::error::{panic_message, EmitError, Result};
use crate::listener::{AnyListener, Listener};
use crate::types::{EmitterConfig, ListenerOptions, PanicPolicy};

use state::{Entry, RegistryState};

type PanicPayload = Box<dyn Any + Send>;

/// Typed synchronous event emitter.
///
/// `K` names event channels (see [`EventKey`](crate::key::EventKey) for a
/// ready-made key type), `T` is the payload type. Use `()` for payload-less
/// events, a tuple for several arguments, or an enum when different keys
/// carry different shapes.
pub struct Emitter<K, T> {
    /// Shared with cancellation observers, which hold a `Weak` to it.
    state: Arc<Mutex<RegistryState<K, T>>>,
    config: EmitterConfig,
}

impl<K, T> Emitter<K, T>
where
    K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
    T: 'static,
{
    /// Create a new, empty emitter with the default configuration.
    pub fn new() -> Self {
        Self::with_config(EmitterConfig::default())
    }

    pub fn with_config(config: EmitterConfig) -> Self {
        Self {
            state: Arc::new(Mutex::new(RegistryState::new())),
            config,
        }
    }

    pub fn config(&self) -> &EmitterConfig {
        &self.config
    }

    // ------------------------------------------------------------------------
    // Registration
    // ------------------------------------------------------------------------

    /// Register `listener` for `key`.
    ///
    /// Silently does nothing if the listener is already registered for `key`
    /// (the first registration's options stay in effect) or if
    /// `options.signal` has already fired.
    pub fn on(&self, key: K, listener: &Listener<T>, options: ListenerOptions) {
        let ListenerOptions { once, signal } = options;
        if signal.as_ref().is_some_and(|s| s.is_cancelled()) {
            tracing::trace!(event = ?key, "signal already cancelled; listener not registered");
            return;
        }

        let inserted = self.state.lock().insert_event(key.clone(), listener, once);
        let Some(seq) = inserted else {
            tracing::trace!(event = ?key, "listener already registered; ignoring");
            return;
        };
        tracing::trace!(event = ?key, once, "listener registered");

        if let Some(signal) = signal {
            let weak = Arc::downgrade(&self.state);
            let observer_key = key.clone();
            let detach = signal.subscribe(Box::new(move || {
                remove_cancelled(&weak, |state| state.remove_event_seq(&observer_key, seq));
            }));
            let orphan = self.state.lock().attach_event(&key, seq, detach);
            release_orphan(orphan);
        }
    }

    /// Register `listener` for `key` so that it fires at most once.
    pub fn once(&self, key: K, listener: &Listener<T>) {
        self.on(key, listener, ListenerOptions::once());
    }

    /// Remove `listener` from `key`. Unknown listeners are ignored.
    pub fn off(&self, key: &K, listener: &Listener<T>) {
        let removed = self.state.lock().remove_event_id(key, listener.id());
        if let Some(entry) = removed {
            tracing::trace!(event = ?key, "listener removed");
            entry.release();
        }
    }

    /// Register a catch-all listener, called with `(key, payload)` after the
    /// key's own listeners. Keys without listeners are not dispatched, so
    /// catch-alls do not see them.
    pub fn on_any(&self, listener: &AnyListener<K, T>, options: ListenerOptions) {
        let ListenerOptions { once, signal } = options;
        if signal.as_ref().is_some_and(|s| s.is_cancelled()) {
            tracing::trace!("signal already cancelled; catch-all listener not registered");
            return;
        }

        let inserted = self.state.lock().insert_any(listener, once);
        let Some(seq) = inserted else {
            tracing::trace!("catch-all listener already registered; ignoring");
            return;
        };
        tracing::trace!(once, "catch-all listener registered");

        if let Some(signal) = signal {
            let weak = Arc::downgrade(&self.state);
            let detach = signal.subscribe(Box::new(move || {
                remove_cancelled(&weak, |state| state.remove_any_seq(seq));
            }));
            let orphan = self.state.lock().attach_any(seq, detach);
            release_orphan(orphan);
        }
    }

    /// Remove a catch-all listener. Unknown listeners are ignored.
    pub fn off_any(&self, listener: &AnyListener<K, T>) {
        let removed = self.state.lock().remove_any_id(listener.id());
        if let Some(entry) = removed {
            tracing::trace!("catch-all listener removed");
            entry.release();
        }
    }

    /// Remove every listener registered for `key`.
    pub fn clear(&self, key: &K) {
        let removed = self.state.lock().remove_event_all(key);
        if !removed.is_empty() {
            tracing::trace!(event = ?key, count = removed.len(), "listeners cleared");
        }
        removed.into_iter().for_each(Entry::release);
    }

    /// Remove every listener, including catch-alls.
    pub fn clear_all(&self) {
        self.release_all();
    }

    // ------------------------------------------------------------------------
    // Dispatch
    // ------------------------------------------------------------------------

    /// Emit `payload` on `key`.
    ///
    /// Under [`PanicPolicy::Propagate`] a panicking listener's panic resumes
    /// out of this call once its `once` cleanup has run; the remaining
    /// listeners of this pass are not called.
    pub fn emit(&self, key: &K, payload: &T) {
        if let Err(panic) = self.dispatch(key, payload) {
            std::panic::resume_unwind(panic);
        }
    }

    /// Like [`emit`](Self::emit), but a listener panic is returned as
    /// [`EmitError::ListenerPanicked`] instead of unwinding.
    ///
    /// Under [`PanicPolicy::Isolate`] panics are swallowed and this always
    /// returns `Ok`.
    pub fn try_emit(&self, key: &K, payload: &T) -> Result<()> {
        self.dispatch(key, payload)
            .map_err(|panic| EmitError::listener_panicked(key, &*panic))
    }

    fn dispatch(&self, key: &K, payload: &T) -> std::result::Result<(), PanicPayload> {
        // Snapshot under the lock (cheap: Arc clones), then release it.
        let snapshot = self.state.lock().snapshot_event(key);
        // A key nobody listens to is a no-op; catch-alls are not consulted.
        if snapshot.is_empty() {
            return Ok(());
        }
        for (seq, listener, once) in snapshot {
            let live = self.state.lock().is_live(seq);
            if !live {
                continue;
            }
            let outcome = catch_unwind(AssertUnwindSafe(|| listener.call(payload)));
            if once {
                let removed = self.state.lock().remove_event_seq(key, seq);
                if let Some(entry) = removed {
                    entry.release();
                }
            }
            if let Err(panic) = outcome {
                self.handle_panic(key, panic)?;
            }
        }

        let snapshot = self.state.lock().snapshot_any();
        for (seq, listener, once) in snapshot {
            let live = self.state.lock().is_live(seq);
            if !live {
                continue;
            }
            let outcome = catch_unwind(AssertUnwindSafe(|| listener.call(key, payload)));
            if once {
                let removed = self.state.lock().remove_any_seq(seq);
                if let Some(entry) = removed {
                    entry.release();
                }
            }
            if let Err(panic) = outcome {
                self.handle_panic(key, panic)?;
            }
        }

        Ok(())
    }

    fn handle_panic(&self, key: &K, panic: PanicPayload) -> std::result::Result<(), PanicPayload> {
        match self.config.panic_policy {
            PanicPolicy::Propagate => Err(panic),
            PanicPolicy::Isolate => {
                tracing::error!(
                    event = ?key,
                    panic = %panic_message(&*panic),
                    "listener panicked; continuing dispatch"
                );
                Ok(())
            }
        }
    }

    // ------------------------------------------------------------------------
    // Introspection
    // ------------------------------------------------------------------------

    /// Number of listeners currently registered for `key`.
    pub fn listener_count(&self, key: &K) -> usize {
        self.state.lock().listener_count(key)
    }

    pub fn any_listener_count(&self) -> usize {
        self.state.lock().any_listener_count()
    }

    /// Number of keys with at least one listener.
    pub fn event_count(&self) -> usize {
        self.state.lock().event_count()
    }

    /// Whether no listeners (per-key or catch-all) are registered.
    pub fn is_empty(&self) -> bool {
        let state = self.state.lock();
        state.event_count() == 0 && state.any_listener_count() == 0
    }

    pub fn has_listener(&self, key: &K, listener: &Listener<T>) -> bool {
        self.state.lock().has_event_listener(key, listener.id())
    }

    pub fn has_any_listener(&self, listener: &AnyListener<K, T>) -> bool {
        self.state.lock().has_any_listener(listener.id())
    }
}

impl<K> Emitter<K, ()>
where
    K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
{
    /// Emit a payload-less event.
    pub fn notify(&self, key: &K) {
        self.emit(key, &());
    }
}

/// Observer body shared by `on` and `on_any`: remove the entry if the emitter
/// is still alive.
fn remove_cancelled<K, T, C>(
    weak: &Weak<Mutex<RegistryState<K, T>>>,
    remove: impl FnOnce(&mut RegistryState<K, T>) -> Option<Entry<C>>,
) {
    let Some(state) = weak.upgrade() else {
        return;
    };
    let mut guard = state.lock();
    let removed = remove(&mut *guard);
    drop(guard);
    if let Some(entry) = removed {
        tracing::debug!(seq = entry.seq, "listener removed by cancellation signal");
        entry.release();
    }
}

/// The signal fired (or the entry was removed) before `detach` could be
/// stored; detach right away so the signal holds no dead observer.
fn release_orphan(orphan: Option<Unsubscribe>) {
    if let Some(detach) = orphan {
        detach();
    }
}

impl<K, T> Default for Emitter<K, T>
where
    K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
    T: 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, T> Emitter<K, T> {
    fn release_all(&self) {
        let (events, any) = self.state.lock().drain();
        events.into_iter().for_each(Entry::release);
        any.into_iter().for_each(Entry::release);
    }
}

impl<K, T> Drop for Emitter<K, T> {
    fn drop(&mut self) {
        // Long-lived signals must not keep observers for a dropped registry.
        self.release_all();
    }
}

impl<K, T> std::fmt::Debug for Emitter<K, T>
where
    K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
    T: 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Emitter")
            .field("event_count", &self.event_count())
            .field("any_listener_count", &self.any_listener_count())
            .field("config", &self.config)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
