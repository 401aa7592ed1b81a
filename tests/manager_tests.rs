use cachelink::{
    manager_for, AcquireError, AnyManager, CacheConfiguration, ConcurrentManager, LockingMode,
    Manager, ManagerKind, Release, TransactionMode,
};
use std::convert::Infallible;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, Mutex};
use std::thread;

/// A resource that hands itself back to its manager when closed.
struct Session {
    id: String,
    release: Release,
}

impl Session {
    fn open(id: &str, release: Release) -> Result<Option<Session>, Infallible> {
        Ok(Some(Session {
            id: id.to_string(),
            release,
        }))
    }

    fn close(&self) {
        self.release.release();
    }
}

fn counting_manager(closes: &Arc<AtomicUsize>) -> ConcurrentManager<String, Session> {
    let closes = Arc::clone(closes);
    ConcurrentManager::builder()
        .close_task(move |_: &Session| {
            closes.fetch_add(1, Ordering::SeqCst);
        })
        .build()
}

/// Concurrent callers for one key share a single value built by a single factory call
#[test]
fn test_concurrent_acquire_constructs_once() {
    const THREADS: usize = 32;

    let closes = Arc::new(AtomicUsize::new(0));
    let factory_calls = Arc::new(AtomicUsize::new(0));
    let manager = counting_manager(&closes);
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let manager = manager.clone();
            let barrier = Arc::clone(&barrier);
            let factory_calls = Arc::clone(&factory_calls);
            thread::spawn(move || {
                barrier.wait();
                manager
                    .acquire("shared".to_string(), |release| {
                        factory_calls.fetch_add(1, Ordering::SeqCst);
                        // Widen the window in which other threads arrive.
                        thread::yield_now();
                        Session::open("shared", release)
                    })
                    .unwrap()
            })
        })
        .collect();

    let sessions: Vec<Arc<Session>> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(factory_calls.load(Ordering::SeqCst), 1);
    assert!(sessions.iter().all(|s| Arc::ptr_eq(s, &sessions[0])));
    assert_eq!(manager.reference_count(&"shared".to_string()), Some(THREADS));

    for session in &sessions {
        session.close();
    }
    assert_eq!(closes.load(Ordering::SeqCst), 1);
    assert!(manager.is_empty());
}

/// The close task fires exactly once, on the last release, whatever the release order
#[test]
fn test_close_fires_once_in_any_release_order() {
    for round in 0..20 {
        let closes = Arc::new(AtomicUsize::new(0));
        let manager = counting_manager(&closes);
        let holders = 2 + round % 7;

        let mut sessions: Vec<Arc<Session>> = (0..holders)
            .map(|_| {
                manager
                    .acquire("k".to_string(), |release| Session::open("k", release))
                    .unwrap()
            })
            .collect();
        fastrand::shuffle(&mut sessions);

        let (last, rest) = sessions.split_last().unwrap();
        for session in rest {
            session.close();
            assert_eq!(closes.load(Ordering::SeqCst), 0);
        }
        last.close();
        assert_eq!(closes.load(Ordering::SeqCst), 1);
        assert!(!manager.contains_key(&"k".to_string()));

        // A later acquisition starts over with a new value.
        let factory_calls = AtomicUsize::new(0);
        let fresh = manager
            .acquire("k".to_string(), |release| {
                factory_calls.fetch_add(1, Ordering::SeqCst);
                Session::open("k", release)
            })
            .unwrap();
        assert_eq!(factory_calls.load(Ordering::SeqCst), 1);
        assert!(!Arc::ptr_eq(&fresh, last));
        fresh.close();
        assert_eq!(closes.load(Ordering::SeqCst), 2);
    }
}

/// Releases racing from many threads still close the value exactly once
#[test]
fn test_parallel_release_closes_once() {
    const THREADS: usize = 16;

    let closes = Arc::new(AtomicUsize::new(0));
    let manager = counting_manager(&closes);
    let sessions: Vec<Arc<Session>> = (0..THREADS)
        .map(|_| {
            manager
                .acquire("k".to_string(), |release| Session::open("k", release))
                .unwrap()
        })
        .collect();

    let barrier = Arc::new(Barrier::new(THREADS));
    let handles: Vec<_> = sessions
        .into_iter()
        .map(|session| {
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                session.close();
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(closes.load(Ordering::SeqCst), 1);
    assert!(manager.is_empty());
}

/// A failing factory leaves nothing behind, and the successful holders still close once
#[test]
fn test_factory_failure_does_not_leak_a_holder() {
    const THREADS: usize = 12;
    const FAILING_CALL: usize = 1;

    let closes = Arc::new(AtomicUsize::new(0));
    let manager = counting_manager(&closes);
    let calls = Arc::new(AtomicUsize::new(0));
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let manager = manager.clone();
            let calls = Arc::clone(&calls);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                manager.acquire("k".to_string(), |release| {
                    if calls.fetch_add(1, Ordering::SeqCst) + 1 == FAILING_CALL {
                        return Err("backend unavailable");
                    }
                    Ok(Some(Session {
                        id: "k".to_string(),
                        release,
                    }))
                })
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let failures = results.iter().filter(|r| r.is_err()).count();
    let sessions: Vec<&Arc<Session>> = results.iter().filter_map(|r| r.as_ref().ok()).collect();

    assert_eq!(failures, 1);
    assert_eq!(
        results.iter().find_map(|r| r.as_ref().err()),
        Some(&AcquireError::Factory("backend unavailable"))
    );
    assert_eq!(sessions.len(), THREADS - 1);
    assert_eq!(
        manager.reference_count(&"k".to_string()),
        Some(THREADS - 1)
    );

    for session in sessions {
        session.close();
    }
    assert_eq!(closes.load(Ordering::SeqCst), 1);
    assert!(manager.is_empty());
}

/// Panics in the factory or in either task leave the holder counts consistent
#[test]
fn test_panicking_lifecycle_does_not_leak_a_holder() {
    let fail_create = Arc::new(AtomicBool::new(true));
    let fail_close = Arc::new(AtomicBool::new(true));
    let closes = Arc::new(AtomicUsize::new(0));
    let manager: ConcurrentManager<String, Session> = {
        let (fail_create, fail_close) = (Arc::clone(&fail_create), Arc::clone(&fail_close));
        let closes = Arc::clone(&closes);
        ConcurrentManager::builder()
            .create_task(move |_: &Session| {
                if fail_create.swap(false, Ordering::SeqCst) {
                    panic!("session could not be registered");
                }
            })
            .close_task(move |_: &Session| {
                closes.fetch_add(1, Ordering::SeqCst);
                if fail_close.swap(false, Ordering::SeqCst) {
                    panic!("session could not be flushed");
                }
            })
            .build()
    };
    let key = "sessionY".to_string();

    let factory_panic = panic::catch_unwind(AssertUnwindSafe(|| {
        manager.acquire(key.clone(), |_| -> Result<Option<Session>, Infallible> {
            panic!("backend unavailable")
        })
    }));
    assert!(factory_panic.is_err());
    assert_eq!(manager.reference_count(&key), None);

    let create_panic = panic::catch_unwind(AssertUnwindSafe(|| {
        manager.acquire(key.clone(), |release| Session::open("sessionY", release))
    }));
    assert!(create_panic.is_err());
    assert_eq!(manager.reference_count(&key), None);

    let session = manager
        .acquire(key.clone(), |release| Session::open("sessionY", release))
        .unwrap();
    assert_eq!(manager.reference_count(&key), Some(1));

    let close_panic = panic::catch_unwind(AssertUnwindSafe(|| session.close()));
    assert!(close_panic.is_err());
    assert_eq!(closes.load(Ordering::SeqCst), 1);
    assert!(manager.is_empty());

    let factory_calls = AtomicUsize::new(0);
    let reopened = manager
        .acquire(key.clone(), |release| {
            factory_calls.fetch_add(1, Ordering::SeqCst);
            Session::open("sessionY", release)
        })
        .unwrap();
    assert_eq!(factory_calls.load(Ordering::SeqCst), 1);
    assert!(!Arc::ptr_eq(&reopened, &session));
    reopened.close();
    assert_eq!(closes.load(Ordering::SeqCst), 2);
    assert!(manager.is_empty());
}

/// A declined construction reports the key as absent and registers nothing
#[test]
fn test_declined_acquire_leaves_no_entry() {
    let closes = Arc::new(AtomicUsize::new(0));
    let manager = counting_manager(&closes);

    let result = manager.acquire("missing".to_string(), |_| Ok::<_, Infallible>(None));
    assert!(matches!(result, Err(AcquireError::Declined)));
    assert!(manager.is_empty());
    assert_eq!(closes.load(Ordering::SeqCst), 0);
}

/// Two callers share one session, it closes once after both release, and a later caller reopens it
#[test]
fn test_shared_session_scenario() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let closed = Arc::new(Mutex::new(Vec::<String>::new()));
    let manager: ConcurrentManager<String, Session> = {
        let closed = Arc::clone(&closed);
        ConcurrentManager::builder()
            .close_task(move |session: &Session| closed.lock().unwrap().push(session.id.clone()))
            .build()
    };

    let barrier = Arc::new(Barrier::new(2));
    let handles: Vec<_> = (0..2)
        .map(|_| {
            let manager = manager.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                manager
                    .acquire("sessionX".to_string(), |release| {
                        Session::open("sessionX", release)
                    })
                    .unwrap()
            })
        })
        .collect();
    let sessions: Vec<Arc<Session>> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert!(Arc::ptr_eq(&sessions[0], &sessions[1]));
    sessions[0].close();
    assert!(closed.lock().unwrap().is_empty());
    sessions[1].close();
    assert_eq!(*closed.lock().unwrap(), vec!["sessionX".to_string()]);

    let reopened = AtomicUsize::new(0);
    let third = manager
        .acquire("sessionX".to_string(), |release| {
            reopened.fetch_add(1, Ordering::SeqCst);
            Session::open("sessionX", release)
        })
        .unwrap();
    assert_eq!(reopened.load(Ordering::SeqCst), 1);
    assert!(!Arc::ptr_eq(&third, &sessions[0]));
    third.close();
}

/// Caches that lock on read get unshared values
#[test]
fn test_manager_for_lock_on_read_cache() {
    let configuration = CacheConfiguration {
        transaction: TransactionMode::NonXa,
        locking: LockingMode::Pessimistic,
        ..CacheConfiguration::default()
    };
    let manager: AnyManager<String, Session> = manager_for(&configuration.properties());
    assert_eq!(manager.kind(), ManagerKind::Simple);

    let a = manager
        .acquire("k".to_string(), |release| Session::open("k", release))
        .unwrap();
    let b = manager
        .acquire("k".to_string(), |release| Session::open("k", release))
        .unwrap();
    assert!(!Arc::ptr_eq(&a, &b));
    a.close();
    b.close();
}

/// Unlocked caches share values between callers
#[test]
fn test_manager_for_optimistic_cache() {
    let manager: AnyManager<String, Session> =
        manager_for(&CacheConfiguration::default().properties());
    assert_eq!(manager.kind(), ManagerKind::Concurrent);

    let a = manager
        .acquire("k".to_string(), |release| Session::open("k", release))
        .unwrap();
    let b = manager
        .acquire("k".to_string(), |_| Ok::<_, Infallible>(None))
        .unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    a.close();
    b.close();
}
