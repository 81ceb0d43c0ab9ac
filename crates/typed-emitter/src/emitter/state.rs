//! Registry bookkeeping: ordered listener entries per key plus catch-alls.
//!
//! Nothing here runs user callbacks. Every method is a short critical section
//! called by `Emitter` with the state lock held; entries that get removed are
//! handed back to the caller so their cancellation observers are detached (and
//! their callbacks dropped) after the lock is released.
//!
//! Serials of live entries are also kept in a set, so the per-callback live
//! check during dispatch is a hash lookup instead of a list scan.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use crate::cancel::Unsubscribe;
use crate::listener::{AnyListener, Callback, Listener, ListenerId};

/// One registered callback.
pub(crate) struct Entry<C> {
    /// Registry-wide serial; a removed and re-added callback gets a new one.
    pub seq: u64,
    pub callback: C,
    pub once: bool,
    /// Detaches the observer wired to this entry's cancellation signal.
    pub detach: Option<Unsubscribe>,
}

impl<C> Entry<C> {
    /// Detach the cancellation observer, if any. Must be called without the
    /// state lock held.
    pub fn release(self) {
        if let Some(detach) = self.detach {
            detach();
        }
    }
}

/// What a dispatch pass iterates over: `(seq, callback, once)`.
pub(crate) type Snapshot<C> = Vec<(u64, C, bool)>;

// ============================================================================
// Ordered entry list helpers (shared by per-key and catch-all lists)
// ============================================================================

fn contains_id<C: Callback>(list: &[Entry<C>], id: ListenerId) -> bool {
    list.iter().any(|e| e.callback.id() == id)
}

fn take_where<C>(list: &mut Vec<Entry<C>>, pred: impl Fn(&Entry<C>) -> bool) -> Option<Entry<C>> {
    let pos = list.iter().position(pred)?;
    // `remove` (not `swap_remove`) keeps the remaining entries in dispatch order.
    Some(list.remove(pos))
}

fn snapshot_of<C: Clone>(list: &[Entry<C>]) -> Snapshot<C> {
    list.iter()
        .map(|e| (e.seq, e.callback.clone(), e.once))
        .collect()
}

/// Store `detach` on the entry with `seq`; hands it back if the entry is gone.
fn attach_to<C>(list: Option<&mut Vec<Entry<C>>>, seq: u64, detach: Unsubscribe) -> Option<Unsubscribe> {
    match list.and_then(|l| l.iter_mut().find(|e| e.seq == seq)) {
        Some(entry) => {
            entry.detach = Some(detach);
            None
        }
        None => Some(detach),
    }
}

// ============================================================================
// RegistryState
// ============================================================================

pub(crate) struct RegistryState<K, T> {
    /// Listener entries per key, in registration order. Keys with no entries
    /// are removed from the map.
    events: HashMap<K, Vec<Entry<Listener<T>>>>,
    /// Catch-all entries in registration order.
    any: Vec<Entry<AnyListener<K, T>>>,
    /// Serials of every entry in `events` and `any`.
    live: HashSet<u64>,
    next_seq: u64,
}

impl<K: Eq + Hash, T> RegistryState<K, T> {
    pub fn new() -> Self {
        Self {
            events: HashMap::new(),
            any: Vec::new(),
            live: HashSet::new(),
            next_seq: 1,
        }
    }

    fn next_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.live.insert(seq);
        seq
    }

    fn forget<C>(&mut self, entry: Option<Entry<C>>) -> Option<Entry<C>> {
        if let Some(entry) = &entry {
            self.live.remove(&entry.seq);
        }
        entry
    }

    /// Whether the entry with `seq` (per-key or catch-all) is still registered.
    pub fn is_live(&self, seq: u64) -> bool {
        self.live.contains(&seq)
    }

    // --- per-key entries ---

    /// Append an entry for `listener` under `key`.
    ///
    /// Returns `None` (and changes nothing) if the listener is already
    /// registered for that key.
    pub fn insert_event(&mut self, key: K, listener: &Listener<T>, once: bool) -> Option<u64> {
        if self
            .events
            .get(&key)
            .is_some_and(|list| contains_id(list, listener.id()))
        {
            return None;
        }
        let seq = self.next_seq();
        self.events.entry(key).or_default().push(Entry {
            seq,
            callback: listener.clone(),
            once,
            detach: None,
        });
        Some(seq)
    }

    pub fn attach_event(&mut self, key: &K, seq: u64, detach: Unsubscribe) -> Option<Unsubscribe> {
        attach_to(self.events.get_mut(key), seq, detach)
    }

    pub fn remove_event_id(&mut self, key: &K, id: ListenerId) -> Option<Entry<Listener<T>>> {
        self.remove_event_where(key, |e| e.callback.id() == id)
    }

    pub fn remove_event_seq(&mut self, key: &K, seq: u64) -> Option<Entry<Listener<T>>> {
        self.remove_event_where(key, |e| e.seq == seq)
    }

    fn remove_event_where(
        &mut self,
        key: &K,
        pred: impl Fn(&Entry<Listener<T>>) -> bool,
    ) -> Option<Entry<Listener<T>>> {
        let list = self.events.get_mut(key)?;
        let removed = take_where(list, pred);
        if list.is_empty() {
            self.events.remove(key);
        }
        self.forget(removed)
    }

    pub fn remove_event_all(&mut self, key: &K) -> Vec<Entry<Listener<T>>> {
        let removed = self.events.remove(key).unwrap_or_default();
        for entry in &removed {
            self.live.remove(&entry.seq);
        }
        removed
    }

    pub fn snapshot_event(&self, key: &K) -> Snapshot<Listener<T>> {
        self.events
            .get(key)
            .map(|list| snapshot_of(list))
            .unwrap_or_default()
    }

    pub fn has_event_listener(&self, key: &K, id: ListenerId) -> bool {
        self.events.get(key).is_some_and(|list| contains_id(list, id))
    }

    pub fn listener_count(&self, key: &K) -> usize {
        self.events.get(key).map_or(0, Vec::len)
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    // --- catch-all entries ---

    pub fn insert_any(&mut self, listener: &AnyListener<K, T>, once: bool) -> Option<u64> {
        if contains_id(&self.any, listener.id()) {
            return None;
        }
        let seq = self.next_seq();
        self.any.push(Entry {
            seq,
            callback: listener.clone(),
            once,
            detach: None,
        });
        Some(seq)
    }

    pub fn attach_any(&mut self, seq: u64, detach: Unsubscribe) -> Option<Unsubscribe> {
        attach_to(Some(&mut self.any), seq, detach)
    }

    pub fn remove_any_id(&mut self, id: ListenerId) -> Option<Entry<AnyListener<K, T>>> {
        let removed = take_where(&mut self.any, |e| e.callback.id() == id);
        self.forget(removed)
    }

    pub fn remove_any_seq(&mut self, seq: u64) -> Option<Entry<AnyListener<K, T>>> {
        let removed = take_where(&mut self.any, |e| e.seq == seq);
        self.forget(removed)
    }

    pub fn snapshot_any(&self) -> Snapshot<AnyListener<K, T>> {
        snapshot_of(&self.any)
    }

    pub fn has_any_listener(&self, id: ListenerId) -> bool {
        contains_id(&self.any, id)
    }

    pub fn any_listener_count(&self) -> usize {
        self.any.len()
    }
}

impl<K, T> RegistryState<K, T> {
    /// Remove every entry, returning them for release outside the lock.
    pub fn drain(&mut self) -> (Vec<Entry<Listener<T>>>, Vec<Entry<AnyListener<K, T>>>) {
        self.live.clear();
        let events = self.events.drain().flat_map(|(_, list)| list).collect();
        (events, std::mem::take(&mut self.any))
    }
}

// ============================================================================
// Tests
// ============================================================================
