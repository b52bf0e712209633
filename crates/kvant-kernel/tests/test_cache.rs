//! Tests for the two-phase LRU cache.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use kvant_kernel::cache::{LruCache, Probe};
use kvant_kernel::KernelError;

// ---------------------------------------------------------------------------
// LRU bookkeeping
// ---------------------------------------------------------------------------

#[test]
fn lookup_miss_is_absent() {
    let cache: LruCache<u32, u32> = LruCache::new(2);
    assert_eq!(cache.lookup(&1), Probe::Absent);
}

#[test]
fn capacity_bound_holds_under_churn() {
    let cache = LruCache::new(3);
    for k in 0u32..10 {
        cache.reserve(k);
        cache.publish(&k, k);
    }
    assert_eq!(cache.len(), 3);
}

#[test]
fn eviction_takes_the_least_recently_used() {
    let cache = LruCache::new(2);
    cache.reserve(1u32);
    cache.publish(&1, 10u32);
    cache.reserve(2);
    cache.publish(&2, 20);

    // Touch 1, leaving 2 as the LRU.
    assert_eq!(cache.lookup(&1), Probe::Filled(10));

    cache.reserve(3);
    cache.publish(&3, 30);
    assert_eq!(cache.lookup(&2), Probe::Absent);
    assert_eq!(cache.lookup(&1), Probe::Filled(10));
    assert_eq!(cache.lookup(&3), Probe::Filled(30));
}

#[test]
fn evicted_entry_is_recomputed_after_a_fresh_reserve() {
    let cache = LruCache::new(1);
    let computed = AtomicUsize::new(0);

    cache
        .get_or_compute(&1u32, || {
            computed.fetch_add(1, Ordering::SeqCst);
            10u32
        })
        .unwrap();
    // Evicts 1.
    cache
        .get_or_compute(&2, || {
            computed.fetch_add(1, Ordering::SeqCst);
            20
        })
        .unwrap();
    assert_eq!(cache.lookup(&1), Probe::Absent);

    cache
        .get_or_compute(&1, || {
            computed.fetch_add(1, Ordering::SeqCst);
            10
        })
        .unwrap();
    assert_eq!(computed.load(Ordering::SeqCst), 3);
}

#[test]
fn cached_hit_skips_the_computation() {
    let cache = LruCache::new(4);
    let computed = AtomicUsize::new(0);

    for _ in 0..5 {
        let value = cache
            .get_or_compute(&1u32, || {
                computed.fetch_add(1, Ordering::SeqCst);
                10u32
            })
            .unwrap();
        assert_eq!(value, 10);
    }
    assert_eq!(computed.load(Ordering::SeqCst), 1);
}

#[test]
fn reserved_entries_are_not_evicted() {
    let cache = LruCache::new(2);
    cache.reserve(1u32);
    cache.reserve(2);
    // At capacity with both slots pending: a third reservation overflows
    // rather than dropping a slot waiters may be blocked on.
    cache.reserve(3);
    assert_eq!(cache.len(), 3);
    assert_eq!(cache.lookup(&1), Probe::Reserved::<u32>);
    assert_eq!(cache.lookup(&2), Probe::Reserved);

    cache.publish(&1, 1u32);
    cache.publish(&2, 2);
    cache.publish(&3, 3);
    // The overflow drains at the next eviction.
    cache.reserve(4);
    assert_eq!(cache.len(), 3);
}

// ---------------------------------------------------------------------------
// Two-phase protocol
// ---------------------------------------------------------------------------

#[test]
fn concurrent_get_or_compute_computes_once() {
    let cache: Arc<LruCache<u32, u32>> = Arc::new(LruCache::new(4));
    let computed = Arc::new(AtomicUsize::new(0));

    let mut handles = Vec::new();
    for _ in 0..8 {
        let cache = Arc::clone(&cache);
        let computed = Arc::clone(&computed);
        handles.push(thread::spawn(move || {
            cache
                .get_or_compute(&7, || {
                    computed.fetch_add(1, Ordering::SeqCst);
                    // Widen the window in which other threads see the
                    // reservation.
                    thread::sleep(Duration::from_millis(50));
                    42
                })
                .unwrap()
        }));
    }
    for handle in handles {
        assert_eq!(handle.join().unwrap(), 42);
    }
    assert_eq!(computed.load(Ordering::SeqCst), 1);
}

#[test]
fn waiters_observe_the_published_value() {
    let cache: Arc<LruCache<u32, u32>> = Arc::new(LruCache::new(4));
    cache.reserve(1);

    let waiter = {
        let cache = Arc::clone(&cache);
        thread::spawn(move || cache.get_or_compute(&1, || unreachable!()).unwrap())
    };
    thread::sleep(Duration::from_millis(50));
    cache.publish(&1, 99);
    assert_eq!(waiter.join().unwrap(), 99);
}

#[test]
fn panicked_computation_fails_its_waiters() {
    let cache: Arc<LruCache<u32, u32>> = Arc::new(LruCache::new(4));

    let computer = {
        let cache = Arc::clone(&cache);
        thread::spawn(move || {
            let _ = cache.get_or_compute(&1, || {
                thread::sleep(Duration::from_millis(200));
                panic!("computation died");
            });
        })
    };
    thread::sleep(Duration::from_millis(50));
    let waiter = {
        let cache = Arc::clone(&cache);
        thread::spawn(move || cache.get_or_compute(&1, || 5))
    };

    assert!(computer.join().is_err());
    assert!(matches!(
        waiter.join().unwrap(),
        Err(KernelError::ComputeFailed)
    ));
}

#[test]
fn failed_slot_is_reusable_by_a_fresh_attempt() {
    let cache: Arc<LruCache<u32, u32>> = Arc::new(LruCache::new(4));
    let computer = {
        let cache = Arc::clone(&cache);
        thread::spawn(move || {
            let _ = cache.get_or_compute(&1, || panic!("computation died"));
        })
    };
    assert!(computer.join().is_err());
    assert_eq!(cache.get_or_compute(&1, || 7).unwrap(), 7);
}
