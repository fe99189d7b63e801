//! Registry scenarios with callbacks re-entering the registry.

use super::StageRegistry;
use crate::events::StageEventKind;
use crate::flags::StageFlags;
use crate::stage::Stage;
use crate::testing::EventRecorder;
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::thread;

#[test]
fn test_visitor_may_query_registry() {
    let registry = StageRegistry::new();
    let _a = registry.create("A", None, StageFlags::empty()).unwrap();
    let _b = registry.create("B", None, StageFlags::empty()).unwrap();

    let mut found = 0;
    registry.enumerate(|stage| {
        if registry.find_by_name(&stage.name()).is_some() {
            found += 1;
        }
        true
    });

    assert_eq!(found, 2);
}

#[test]
fn test_visitor_may_create_stages() {
    let registry = StageRegistry::new();
    let _a = registry.create("A", None, StageFlags::empty()).unwrap();
    let mut created = Vec::new();

    registry.enumerate(|stage| {
        created.push(registry.create(&format!("{}-copy", stage.name()), None, StageFlags::empty()));
        true
    });

    assert_eq!(created.len(), 1);
    assert_eq!(registry.len(), 2);
}

#[test]
fn test_visitor_may_release_last_handle() {
    let registry = StageRegistry::new();
    let a = registry.create("A", None, StageFlags::empty()).unwrap();
    let _b = registry.create("B", None, StageFlags::empty()).unwrap();
    let held = Mutex::new(Some(a));

    let mut visited = Vec::new();
    registry.enumerate(|stage| {
        visited.push(stage.name());
        held.lock().take();
        true
    });

    // "A" was destroyed before its turn came and is skipped.
    assert_eq!(visited, vec!["B"]);
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_create_handler_can_find_new_stage() {
    let registry = StageRegistry::new();
    let weak_registry = Arc::downgrade(&registry);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);

    registry.signal_handler().connect(move |event| {
        if matches!(event.kind, StageEventKind::Created) {
            let registry = weak_registry.upgrade().unwrap();
            sink.lock()
                .push(registry.find_by_name(&event.stage_name).is_some());
        }
    });

    let _stage = registry.create("A", None, StageFlags::empty()).unwrap();
    assert_eq!(*seen.lock(), vec![true]);
}

#[test]
fn test_destroy_handler_sees_stage_unlinked_after() {
    let registry = StageRegistry::new();
    let weak_registry = Arc::downgrade(&registry);
    let linked = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&linked);

    registry.signal_handler().connect(move |event| {
        if matches!(event.kind, StageEventKind::Destroyed) {
            let registry = weak_registry.upgrade().unwrap();
            *sink.lock() = Some(registry.len());
        }
    });

    let stage = registry.create("A", None, StageFlags::empty()).unwrap();
    drop(stage);

    assert_eq!(*linked.lock(), Some(1));
    assert!(registry.is_empty());
}

#[test]
fn test_registry_drop_tears_down_stages() {
    let registry = StageRegistry::new();
    let stage = registry.create("A", None, StageFlags::empty()).unwrap();
    let local = EventRecorder::attach(stage.signal_handler());
    let weak = stage.weak();

    drop(registry);

    assert!(stage.is_destroyed());
    assert!(weak.upgrade().is_none());
    assert_eq!(local.names(), vec!["destroy".to_string()]);
}

#[test]
fn test_concurrent_create_and_find() {
    let registry = StageRegistry::new();

    let handles: Vec<_> = (0..4)
        .map(|worker| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                let mut kept: Vec<Stage> = Vec::new();
                for i in 0..25 {
                    let name = format!("w{worker}-{i}");
                    let stage = registry.create(&name, None, StageFlags::empty()).unwrap();
                    assert!(registry.find_by_name(&name).is_some());
                    if i % 2 == 0 {
                        kept.push(stage);
                    }
                }
                kept
            })
        })
        .collect();

    let kept: Vec<Stage> = handles
        .into_iter()
        .flat_map(|handle| handle.join().unwrap())
        .collect();

    assert_eq!(registry.len(), kept.len());
    assert_eq!(kept.len(), 4 * 13);
}
