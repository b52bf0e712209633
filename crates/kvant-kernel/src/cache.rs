//! Bounded LRU caches with a two-phase reserve/publish protocol.
//!
//! A thread that misses reserves the key under the cache lock, drops the
//! lock, runs the expensive computation, then publishes the value and wakes
//! every waiter. Threads that find the key reserved block on the condition
//! variable until the value is published. At most one thread per key ever
//! runs the compute region.
//!
//! Reserved entries are never evicted: eviction picks the least-recently-
//! used filled (or failed) entry, and the cache runs over capacity while
//! every slot has a computation in flight.

use std::hash::Hash;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use rustc_hash::FxHashMap;

use crate::error::{KernelError, KernelResult};

/// Outcome of a non-blocking probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe<V> {
    /// No slot for the key.
    Absent,
    /// Slot allocated, value still being computed.
    Reserved,
    /// Value present.
    Filled(V),
}

#[derive(Debug)]
enum Slot<V> {
    Reserved,
    Filled(V),
    Failed,
}

#[derive(Debug)]
struct Entry<V> {
    slot: Slot<V>,
    stamp: u64,
}

struct Inner<K, V> {
    capacity: usize,
    tick: u64,
    entries: FxHashMap<K, Entry<V>>,
}

impl<K: Eq + Hash + Clone, V> Inner<K, V> {
    fn evict_if_full(&mut self) {
        if self.entries.len() < self.capacity {
            return;
        }
        let victim = self
            .entries
            .iter()
            .filter(|(_, entry)| !matches!(entry.slot, Slot::Reserved))
            .min_by_key(|(_, entry)| entry.stamp)
            .map(|(key, _)| key.clone());
        if let Some(key) = victim {
            self.entries.remove(&key);
        }
    }
}

enum Step<V> {
    Value(V),
    Wait,
    Fail,
    Compute,
    Insert,
}

/// A bounded associative store shared by the service's worker threads.
pub struct LruCache<K, V> {
    inner: Mutex<Inner<K, V>>,
    filled: Condvar,
}

impl<K: Eq + Hash + Clone, V: Clone> LruCache<K, V> {
    /// Create a cache bounded to `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "cache capacity must be positive");
        Self {
            inner: Mutex::new(Inner {
                capacity,
                tick: 0,
                entries: FxHashMap::default(),
            }),
            filled: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner<K, V>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Probe without blocking. A filled hit promotes the key to
    /// most-recently-used.
    pub fn lookup(&self, key: &K) -> Probe<V> {
        let mut inner = self.lock();
        inner.tick += 1;
        let stamp = inner.tick;
        match inner.entries.get_mut(key) {
            None => Probe::Absent,
            Some(entry) => match &entry.slot {
                Slot::Reserved => Probe::Reserved,
                Slot::Failed => Probe::Absent,
                Slot::Filled(value) => {
                    let value = value.clone();
                    entry.stamp = stamp;
                    Probe::Filled(value)
                }
            },
        }
    }

    /// Allocate a slot for `key`. No change when the key is already
    /// reserved or filled; a failed slot is taken over for a fresh attempt.
    pub fn reserve(&self, key: K) {
        let mut inner = self.lock();
        inner.tick += 1;
        let stamp = inner.tick;
        if let Some(entry) = inner.entries.get_mut(&key) {
            if matches!(entry.slot, Slot::Failed) {
                entry.slot = Slot::Reserved;
                entry.stamp = stamp;
            }
        } else {
            inner.evict_if_full();
            inner.entries.insert(
                key,
                Entry {
                    slot: Slot::Reserved,
                    stamp,
                },
            );
        }
    }

    /// Attach a value to `key`'s reservation and wake all waiters. A slot
    /// that is already filled keeps its value.
    pub fn publish(&self, key: &K, value: V) {
        let mut inner = self.lock();
        inner.tick += 1;
        let stamp = inner.tick;
        if let Some(entry) = inner.entries.get_mut(key) {
            if !matches!(entry.slot, Slot::Filled(_)) {
                entry.slot = Slot::Filled(value);
            }
            entry.stamp = stamp;
        }
        drop(inner);
        self.filled.notify_all();
    }

    /// Mark `key`'s pending reservation failed and wake all waiters.
    ///
    /// Threads already waiting observe [`KernelError::ComputeFailed`]; the
    /// slot itself is reusable by a later [`reserve`](Self::reserve).
    pub fn fail(&self, key: &K) {
        let mut inner = self.lock();
        if let Some(entry) = inner.entries.get_mut(key) {
            if matches!(entry.slot, Slot::Reserved) {
                entry.slot = Slot::Failed;
            }
        }
        drop(inner);
        self.filled.notify_all();
    }

    /// Number of live slots, reserved and failed included.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// Whether the cache holds no slots at all.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fetch the value for `key`, computing it at most once across all
    /// threads.
    ///
    /// The computing thread holds no cache lock while `compute` runs. If
    /// `compute` unwinds, the reservation is marked failed and every thread
    /// blocked on it gets [`KernelError::ComputeFailed`].
    pub fn get_or_compute<F>(&self, key: &K, compute: F) -> KernelResult<V>
    where
        F: FnOnce() -> V,
    {
        let mut inner = self.lock();
        let mut waited = false;
        loop {
            inner.tick += 1;
            let stamp = inner.tick;
            let step = if let Some(entry) = inner.entries.get_mut(key) {
                match &entry.slot {
                    Slot::Filled(value) => {
                        let value = value.clone();
                        entry.stamp = stamp;
                        Step::Value(value)
                    }
                    Slot::Reserved => Step::Wait,
                    Slot::Failed if waited => Step::Fail,
                    Slot::Failed => {
                        entry.slot = Slot::Reserved;
                        entry.stamp = stamp;
                        Step::Compute
                    }
                }
            } else {
                Step::Insert
            };
            match step {
                Step::Value(value) => return Ok(value),
                Step::Fail => return Err(KernelError::ComputeFailed),
                Step::Wait => {
                    waited = true;
                    inner = self
                        .filled
                        .wait(inner)
                        .unwrap_or_else(PoisonError::into_inner);
                }
                Step::Compute => break,
                Step::Insert => {
                    inner.evict_if_full();
                    inner.entries.insert(
                        key.clone(),
                        Entry {
                            slot: Slot::Reserved,
                            stamp,
                        },
                    );
                    break;
                }
            }
        }
        drop(inner);

        let mut guard = ReservationGuard {
            cache: self,
            key,
            armed: true,
        };
        let value = compute();
        guard.armed = false;
        drop(guard);

        self.publish(key, value.clone());
        Ok(value)
    }
}

/// Marks the reservation failed if the computing closure unwinds before
/// publishing.
struct ReservationGuard<'a, K: Eq + Hash + Clone, V: Clone> {
    cache: &'a LruCache<K, V>,
    key: &'a K,
    armed: bool,
}

impl<K: Eq + Hash + Clone, V: Clone> Drop for ReservationGuard<'_, K, V> {
    fn drop(&mut self) {
        if self.armed {
            self.cache.fail(self.key);
        }
    }
}
