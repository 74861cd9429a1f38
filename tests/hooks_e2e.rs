use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::unbounded;

use typebus::{BusError, ExecutionError, Hooks};

#[test]
fn fire_returns_after_every_hook_completes() {
    let hooks = Hooks::new();
    let done = Arc::new(AtomicUsize::new(0));

    for delay_ms in [30_u64, 10, 20] {
        let d = Arc::clone(&done);
        hooks
            .add(move || {
                thread::sleep(Duration::from_millis(delay_ms));
                d.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
    }

    let started = Instant::now();
    hooks.fire().unwrap();
    let elapsed = started.elapsed();

    assert_eq!(done.load(Ordering::SeqCst), 3);
    assert!(elapsed >= Duration::from_millis(30));
}

#[test]
fn concurrent_fires_do_not_interleave() {
    let hooks = Arc::new(Hooks::new());
    let active = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));

    for _ in 0..2 {
        let active = Arc::clone(&active);
        let peak = Arc::clone(&peak);
        hooks
            .add(move || {
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                thread::sleep(Duration::from_millis(10));
                active.fetch_sub(1, Ordering::SeqCst);
            })
            .unwrap();
    }

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let hooks = Arc::clone(&hooks);
            thread::spawn(move || hooks.fire())
        })
        .collect();
    for handle in handles {
        handle.join().unwrap().unwrap();
    }

    // Two hooks per fire; a second fire overlapping would push this to 3+.
    assert!(peak.load(Ordering::SeqCst) <= 2);
}

#[test]
fn add_during_fire_waits_and_applies_to_next_fire() {
    let hooks = Arc::new(Hooks::new());
    let (started_tx, started_rx) = unbounded::<()>();

    hooks
        .add(move || {
            let _ = started_tx.send(());
            thread::sleep(Duration::from_millis(20));
        })
        .unwrap();

    let firing = Arc::clone(&hooks);
    let handle = thread::spawn(move || firing.fire());

    started_rx.recv_timeout(Duration::from_secs(1)).unwrap();
    hooks.add(|| {}).unwrap();
    handle.join().unwrap().unwrap();

    assert_eq!(hooks.len(), 2);
}

#[test]
fn failures_are_reported_by_index() {
    let hooks = Hooks::new();
    let ran = Arc::new(AtomicUsize::new(0));

    let r = Arc::clone(&ran);
    hooks
        .add(move || {
            r.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
    hooks
        .add(|| -> Result<(), std::io::Error> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "flush failed"))
        })
        .unwrap();
    let r = Arc::clone(&ran);
    hooks
        .add(move || {
            r.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

    let err = hooks.fire().unwrap_err();
    match err {
        BusError::Execution(ExecutionError::HookFailed { index, source }) => {
            assert_eq!(index, 1);
            assert_eq!(source.to_string(), "flush failed");
        }
        other => panic!("expected hook failure, got {other:?}"),
    }
    assert_eq!(ran.load(Ordering::SeqCst), 2);
}

#[test]
fn panic_in_hook_is_contained() {
    let hooks = Hooks::new();
    let ran = Arc::new(AtomicUsize::new(0));

    hooks
        .add(|| -> Result<(), String> { panic!("{}", String::from("shutdown hook crashed")) })
        .unwrap();
    let r = Arc::clone(&ran);
    hooks
        .add(move || {
            r.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

    let err = hooks.fire().unwrap_err();
    assert!(err.is_execution());
    assert!(err.to_string().contains("shutdown hook crashed"));
    assert_eq!(ran.load(Ordering::SeqCst), 1);
}
