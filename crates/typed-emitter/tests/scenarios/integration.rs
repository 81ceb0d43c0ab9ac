//! End-to-end flows: per-key payload shapes via an enum, catch-all auditing,
//! scoped subscriptions torn down by a shared token, and cross-thread use.

use std::sync::{Arc, Mutex};
use std::thread;

use typed_emitter::{
    AnyListener, CancellationToken, Emitter, EventKey, Listener, ListenerOptions, Symbol,
};

// ============================================================================
// Helpers
// ============================================================================

/// Payload schema: each key carries its own variant.
#[derive(Debug, Clone, PartialEq)]
enum DocEvent {
    Saved { id: String, revision: u32 },
    Deleted { id: String },
    Ready,
}

fn saved() -> EventKey {
    EventKey::name("saved")
}

fn deleted() -> EventKey {
    EventKey::name("deleted")
}

fn make_log() -> Arc<Mutex<Vec<String>>> {
    Arc::new(Mutex::new(Vec::new()))
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn document_lifecycle_with_audit_and_scoped_views() {
    let emitter: Arc<Emitter<EventKey, DocEvent>> = Arc::new(Emitter::new());
    let ready = Symbol::new("ready");
    let audit = make_log();
    let view = make_log();

    // Catch-all audit trail, sees the key for multiplexing.
    let auditor = {
        let audit = Arc::clone(&audit);
        AnyListener::new(move |key: &EventKey, event: &DocEvent| {
            audit.lock().unwrap().push(format!("{key}: {event:?}"));
        })
    };
    emitter.on_any(&auditor, ListenerOptions::default());

    // Persistence outlives any view; it also keeps `saved` audited.
    let persisted = make_log();
    let persist = {
        let persisted = Arc::clone(&persisted);
        Listener::new(move |event: &DocEvent| {
            if let DocEvent::Saved { id, .. } = event {
                persisted.lock().unwrap().push(id.clone());
            }
        })
    };
    emitter.on(saved(), &persist, ListenerOptions::default());

    // A "view" whose subscriptions all share one lifetime.
    let view_scope = CancellationToken::new();
    let on_saved = {
        let view = Arc::clone(&view);
        Listener::new(move |event: &DocEvent| {
            if let DocEvent::Saved { id, revision } = event {
                view.lock().unwrap().push(format!("show {id}@{revision}"));
            }
        })
    };
    let on_deleted = {
        let view = Arc::clone(&view);
        Listener::new(move |event: &DocEvent| {
            if let DocEvent::Deleted { id } = event {
                view.lock().unwrap().push(format!("hide {id}"));
            }
        })
    };
    let scoped = ListenerOptions::default().with_signal(view_scope.signal());
    emitter.on(saved(), &on_saved, scoped.clone());
    emitter.on(deleted(), &on_deleted, scoped);

    // One-shot readiness hook.
    let on_ready = {
        let view = Arc::clone(&view);
        Listener::new(move |_: &DocEvent| view.lock().unwrap().push("ready".to_string()))
    };
    emitter.once(EventKey::from(ready), &on_ready);

    emitter.emit(&EventKey::from(ready), &DocEvent::Ready);
    emitter.emit(&EventKey::from(ready), &DocEvent::Ready);
    emitter.emit(
        &saved(),
        &DocEvent::Saved {
            id: "doc-1".to_string(),
            revision: 1,
        },
    );
    emitter.emit(&deleted(), &DocEvent::Deleted { id: "doc-1".to_string() });

    // Tear the view down; the audit trail keeps going.
    view_scope.cancel();
    emitter.emit(
        &saved(),
        &DocEvent::Saved {
            id: "doc-2".to_string(),
            revision: 1,
        },
    );

    assert_eq!(
        *view.lock().unwrap(),
        vec!["ready", "show doc-1@1", "hide doc-1"]
    );

    assert_eq!(*persisted.lock().unwrap(), vec!["doc-1", "doc-2"]);

    // The second `ready` found no listeners left, so it went unaudited.
    let audit = audit.lock().unwrap();
    assert_eq!(audit.len(), 4);
    assert!(audit[0].starts_with("Symbol(ready): Ready"), "{}", audit[0]);
    assert!(audit[2].starts_with("deleted: Deleted"), "{}", audit[2]);
    assert!(audit[3].starts_with("saved: Saved"), "{}", audit[3]);
    assert!(audit[3].contains("doc-2"), "{}", audit[3]);

    assert_eq!(emitter.event_count(), 1);
    assert_eq!(emitter.any_listener_count(), 1);
}

#[test]
fn emitter_is_shareable_across_threads() {
    let emitter: Arc<Emitter<u32, usize>> = Arc::new(Emitter::new());
    let total = Arc::new(Mutex::new(0usize));

    let adder = {
        let total = Arc::clone(&total);
        Listener::new(move |n: &usize| *total.lock().unwrap() += *n)
    };
    emitter.on(1, &adder, ListenerOptions::default());

    thread::scope(|scope| {
        for _ in 0..4 {
            let emitter = Arc::clone(&emitter);
            scope.spawn(move || {
                for _ in 0..25 {
                    emitter.emit(&1, &1);
                }
            });
        }
    });

    assert_eq!(*total.lock().unwrap(), 100);
}
