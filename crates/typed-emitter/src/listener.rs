//! Listener handles: callbacks with a stable identity.
//!
//! Closures cannot be compared, so a callback is registered through a handle
//! that owns it behind an `Arc`. The allocation *is* the identity: clones of a
//! handle are the same listener, two `Listener::new` calls are two listeners
//! even when they wrap the same function.

use std::fmt;
use std::sync::Arc;

/// Identity of a registered callback.
///
/// Only meaningful while some handle (or a registry entry) keeps the
/// callback alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(usize);

/// Closure type for event listeners.
pub type ListenerFn<T> = dyn Fn(&T) + Send + Sync;

/// Closure type for catch-all listeners; receives the key that was emitted.
pub type AnyListenerFn<K, T> = dyn Fn(&K, &T) + Send + Sync;

pub(crate) trait Callback: Clone {
    fn id(&self) -> ListenerId;
}

// ============================================================================
// Listener
// ============================================================================

/// A callback for one event key.
pub struct Listener<T> {
    callback: Arc<ListenerFn<T>>,
}

impl<T> Listener<T> {
    pub fn new(callback: impl Fn(&T) + Send + Sync + 'static) -> Self {
        Self {
            callback: Arc::new(callback),
        }
    }

    pub fn id(&self) -> ListenerId {
        ListenerId(Arc::as_ptr(&self.callback) as *const () as usize)
    }

    pub(crate) fn call(&self, payload: &T) {
        (self.callback)(payload)
    }
}

impl<T> Callback for Listener<T> {
    fn id(&self) -> ListenerId {
        Listener::id(self)
    }
}

impl<T> Clone for Listener<T> {
    fn clone(&self) -> Self {
        Self {
            callback: Arc::clone(&self.callback),
        }
    }
}

impl<T> PartialEq for Listener<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl<T> Eq for Listener<T> {}

impl<T> fmt::Debug for Listener<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Listener").field(&self.id()).finish()
    }
}

// ============================================================================
// AnyListener
// ============================================================================

/// A catch-all callback, invoked for every emitted key.
pub struct AnyListener<K, T> {
    callback: Arc<AnyListenerFn<K, T>>,
}

impl<K, T> AnyListener<K, T> {
    pub fn new(callback: impl Fn(&K, &T) + Send + Sync + 'static) -> Self {
        Self {
            callback: Arc::new(callback),
        }
    }

    pub fn id(&self) -> ListenerId {
        ListenerId(Arc::as_ptr(&self.callback) as *const () as usize)
    }

    pub(crate) fn call(&self, key: &K, payload: &T) {
        (self.callback)(key, payload)
    }
}

impl<K, T> Callback for AnyListener<K, T> {
    fn id(&self) -> ListenerId {
        AnyListener::id(self)
    }
}

impl<K, T> Clone for AnyListener<K, T> {
    fn clone(&self) -> Self {
        Self {
            callback: Arc::clone(&self.callback),
        }
    }
}

impl<K, T> PartialEq for AnyListener<K, T> {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl<K, T> Eq for AnyListener<K, T> {}

impl<K, T> fmt::Debug for AnyListener<K, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AnyListener").field(&self.id()).finish()
    }
}
