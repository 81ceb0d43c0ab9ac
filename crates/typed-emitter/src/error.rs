use std::any::Any;

use thiserror::Error;

// ---------------------------------------------------------------------------
// EmitError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum EmitError {
    #[error("Listener panicked while handling event {key}: {message}")]
    ListenerPanicked {
        /// `Debug` rendering of the event key that was being dispatched.
        key: String,
        message: String,
    },
}

impl EmitError {
    pub(crate) fn listener_panicked(key: &impl std::fmt::Debug, payload: &(dyn Any + Send)) -> Self {
        Self::ListenerPanicked {
            key: format!("{key:?}"),
            message: panic_message(payload),
        }
    }
}

/// Best-effort extraction of the message carried by a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "<non-string panic payload>".to_string()
    }
}

/// Convenience alias; the default error type is `EmitError`.
pub type Result<T, E = EmitError> = std::result::Result<T, E>;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
