use std::sync::Arc;

use crate::cancel::CancellationSignal;

// ============================================================================
// Options structs
// ============================================================================

/// Options for `on()` / `on_any()`.
pub struct ListenerOptions {
    /// Remove the listener right after its first invocation.
    pub once: bool,
    /// Remove the listener when this signal fires. Registration is skipped
    /// entirely if the signal has already fired.
    pub signal: Option<Arc<dyn CancellationSignal>>,
}

impl ListenerOptions {
    /// Options for a listener that fires at most once.
    pub fn once() -> Self {
        Self {
            once: true,
            signal: None,
        }
    }

    pub fn with_signal(mut self, signal: Arc<dyn CancellationSignal>) -> Self {
        self.signal = Some(signal);
        self
    }
}

impl Default for ListenerOptions {
    fn default() -> Self {
        Self {
            once: false,
            signal: None,
        }
    }
}

impl std::fmt::Debug for ListenerOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerOptions")
            .field("once", &self.once)
            .field("signal", &self.signal.as_ref().map(|_| "..."))
            .finish()
    }
}

impl Clone for ListenerOptions {
    fn clone(&self) -> Self {
        Self {
            once: self.once,
            signal: self.signal.clone(),
        }
    }
}

// ============================================================================
// Emitter configuration
// ============================================================================

/// What `emit()` does when a listener panics.
///
/// In both modes a `once` listener is removed even if it panicked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PanicPolicy {
    /// Resume the panic out of `emit()`; later listeners in the same pass are
    /// not called.
    #[default]
    Propagate,
    /// Catch the panic, log it, and keep dispatching.
    Isolate,
}

/// Registry-wide settings.
#[derive(Debug, Clone, Default)]
pub struct EmitterConfig {
    pub panic_policy: PanicPolicy,
}

impl EmitterConfig {
    pub fn with_panic_policy(mut self, panic_policy: PanicPolicy) -> Self {
        self.panic_policy = panic_policy;
        self
    }
}
