//! EventKey: a ready-made key type covering names, integers, and symbols.
//!
//! `Emitter<K, T>` accepts any hashable key, but most callers want to mix
//! short string names with numeric channels and private tokens that can never
//! collide with anything else. Each variant hashes in its own space, so
//! `EventKey::from("322")` and `EventKey::from(322)` are distinct keys.

use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_SYMBOL_ID: AtomicU64 = AtomicU64::new(1);

// ============================================================================
// Symbol
// ============================================================================

/// A unique event token.
///
/// Every call to [`Symbol::new`] yields a value that only compares equal to
/// itself and its copies; the description is for display only.
#[derive(Clone, Copy)]
pub struct Symbol {
    id: u64,
    description: &'static str,
}

impl Symbol {
    pub fn new(description: &'static str) -> Self {
        Self {
            id: NEXT_SYMBOL_ID.fetch_add(1, Ordering::Relaxed),
            description,
        }
    }

    pub fn description(&self) -> &'static str {
        self.description
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Symbol {}

impl Hash for Symbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})#{}", self.description, self.id)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.description)
    }
}

// ============================================================================
// EventKey
// ============================================================================

/// Identifier naming an independent event channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKey {
    /// A string name, e.g. `"saved"`.
    Name(Cow<'static, str>),
    /// An integer channel, e.g. `322`.
    Index(i64),
    /// A unique token created with [`Symbol::new`].
    Symbol(Symbol),
}

impl EventKey {
    /// Build a name key without allocating for `'static` strings.
    pub const fn name(name: &'static str) -> Self {
        Self::Name(Cow::Borrowed(name))
    }
}

impl fmt::Display for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => f.write_str(name),
            Self::Index(index) => write!(f, "{index}"),
            Self::Symbol(symbol) => write!(f, "{symbol}"),
        }
    }
}

impl From<&'static str> for EventKey {
    fn from(name: &'static str) -> Self {
        Self::Name(Cow::Borrowed(name))
    }
}

impl From<String> for EventKey {
    fn from(name: String) -> Self {
        Self::Name(Cow::Owned(name))
    }
}

impl From<i64> for EventKey {
    fn from(index: i64) -> Self {
        Self::Index(index)
    }
}

impl From<i32> for EventKey {
    fn from(index: i32) -> Self {
        Self::Index(i64::from(index))
    }
}

impl From<u32> for EventKey {
    fn from(index: u32) -> Self {
        Self::Index(i64::from(index))
    }
}

impl From<Symbol> for EventKey {
    fn from(symbol: Symbol) -> Self {
        Self::Symbol(symbol)
    }
}

// ============================================================================
// Tests
// ============================================================================
