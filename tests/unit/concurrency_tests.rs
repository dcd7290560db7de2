//! Shared state under concurrent use

use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use ddms_meta::catalog::KEYWORD;
use ddms_meta::component::RawFields;
use ddms_meta::version::VersionRegistry;
use ddms_meta::vocabulary::ControlledVocabulary;

use crate::common::mocks::CountingSource;
use crate::common::test_helpers::engine;

#[test]
fn test_ambient_version_is_shared_but_sessions_are_pinned() {
    let engine = engine();
    let barrier = Barrier::new(2);

    thread::scope(|scope| {
        let a = scope.spawn(|| {
            engine.set_current_version("2.0").unwrap();
            let pinned = engine.current_session();
            barrier.wait();
            // Thread B changes the ambient version here
            barrier.wait();

            let observed = engine.registry().current().token().to_string();
            let keyword = pinned
                .build(&KEYWORD, RawFields::new().text("value", "x"))
                .unwrap();
            (observed, pinned.version().token().to_string(), keyword.namespace().to_string())
        });

        let b = scope.spawn(|| {
            barrier.wait();
            engine.set_current_version("5.0").unwrap();
            barrier.wait();
        });

        b.join().unwrap();
        let (observed, pinned, namespace) = a.join().unwrap();
        assert_eq!(observed, "5.0");
        assert_eq!(pinned, "2.0");
        assert_eq!(namespace, "http://metadata.dod.mil/mdr/ns/DDMS/2.0/");
    });
}

#[test]
fn test_concurrent_first_loads_parse_once() {
    const THREADS: usize = 8;

    let registry = VersionRegistry::builtin().unwrap();
    let v5 = registry.resolve("5.0").unwrap();
    let source = Arc::new(CountingSource::with_delay(Duration::from_millis(50)));
    let vocabulary = ControlledVocabulary::new(source.clone());
    let barrier = Barrier::new(THREADS);

    let sizes: Vec<usize> = thread::scope(|scope| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                scope.spawn(|| {
                    barrier.wait();
                    vocabulary.load("OwnerProducer", &v5).unwrap().tokens().len()
                })
            })
            .collect();
        handles.into_iter().map(|handle| handle.join().unwrap()).collect()
    });

    assert_eq!(source.reads(), 1);
    assert!(sizes.iter().all(|size| *size == sizes[0] && *size > 0));
}

#[test]
fn test_parallel_construction_on_one_engine() {
    let engine = Arc::new(engine());

    let handles: Vec<_> = ["2.0", "3.0", "3.1", "4.0.1", "4.1", "5.0"]
        .into_iter()
        .map(|token| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                let session = engine.session(token).unwrap();
                let keyword = session
                    .build(&KEYWORD, RawFields::new().text("value", token))
                    .unwrap();
                (token, keyword.version().token().to_string())
            })
        })
        .collect();

    for handle in handles {
        let (requested, built) = handle.join().unwrap();
        assert_eq!(requested, built);
    }
    assert_eq!(engine.registry().current().token(), "5.0");
}
