//! Lazily-created per-key mutexes.

use std::sync::{Arc, Mutex};

use rustc_hash::FxHashMap;

/// Process-lifetime table of per-key locks.
///
/// The outer mutex guards only map insertion; the per-key mutexes are what
/// requests hold while touching a key's record. Entries are created on
/// first reference and never removed.
#[derive(Default)]
pub struct KeyLockTable {
    inner: Mutex<FxHashMap<String, Arc<Mutex<()>>>>,
}

impl KeyLockTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch `key`'s lock, creating the entry on first reference.
    pub fn entry(&self, key: &str) -> Arc<Mutex<()>> {
        let mut table = self.inner.lock().expect("key lock table poisoned");
        if let Some(lock) = table.get(key) {
            return Arc::clone(lock);
        }
        let lock = Arc::new(Mutex::new(()));
        table.insert(key.to_string(), Arc::clone(&lock));
        lock
    }

    /// Number of keys ever referenced.
    pub fn len(&self) -> usize {
        self.inner.lock().expect("key lock table poisoned").len()
    }

    /// Whether no key was ever referenced.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_key_yields_the_same_lock() {
        let table = KeyLockTable::new();
        let first = table.entry("a");
        let second = table.entry("a");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn different_keys_get_distinct_locks() {
        let table = KeyLockTable::new();
        let a = table.entry("a");
        let b = table.entry("b");
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn entries_persist_after_release() {
        let table = KeyLockTable::new();
        {
            let lock = table.entry("a");
            let _guard = lock.lock().unwrap();
        }
        assert_eq!(table.len(), 1);
        assert!(table.entry("a").try_lock().is_ok());
    }
}
