//! Strongly-typed, synchronous publish/subscribe registry.
//!
//! ```
//! use typed_emitter::{Emitter, EventKey, Listener, ListenerOptions};
//!
//! let emitter: Emitter<EventKey, i32> = Emitter::new();
//! let print = Listener::new(|n: &i32| println!("got {n}"));
//!
//! emitter.on("a".into(), &print, ListenerOptions::default());
//! emitter.emit(&"a".into(), &1408);
//! emitter.off(&"a".into(), &print);
//! ```

pub mod cancel;
pub mod emitter;
pub mod error;
pub mod key;
pub mod listener;
pub mod types;

pub use cancel::{CancelObserver, CancellationSignal, CancellationToken, Unsubscribe};
pub use emitter::Emitter;
pub use error::{EmitError, Result};
pub use key::{EventKey, Symbol};
pub use listener::{AnyListener, Listener, ListenerId};
pub use types::{EmitterConfig, ListenerOptions, PanicPolicy};
