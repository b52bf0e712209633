//! Shared key → subsystem record registry.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use num_complex::Complex64;
use rustc_hash::FxHashMap;

use crate::error::{KernelError, KernelResult};
use crate::state::Subsystem;

/// Thread-safe mapping from key to its current subsystem record.
///
/// The rw-lock over the map is deliberately coarse: reads take shared mode,
/// mutations exclusive mode. Request-level serialization is the per-key
/// lock protocol in the server, not this lock.
#[derive(Default)]
pub struct StateRegistry {
    states: RwLock<FxHashMap<String, Arc<Subsystem>>>,
}

impl StateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `key` currently has a binding.
    pub fn exists(&self, key: &str) -> bool {
        self.read().contains_key(key)
    }

    /// Shared handle to `key`'s record.
    pub fn get(&self, key: &str) -> KernelResult<Arc<Subsystem>> {
        self.read()
            .get(key)
            .cloned()
            .ok_or_else(|| KernelError::KeyAbsent(key.to_string()))
    }

    /// Bind `keys` to a record built from interleaved `(re, im)` pairs.
    pub fn set_amplitudes(&self, keys: &[String], flat: &[f64]) -> KernelResult<()> {
        let record = Subsystem::from_interleaved(keys.to_vec(), flat)?;
        self.install(record);
        Ok(())
    }

    /// Bind `keys` to a record built from an already-complex vector.
    pub fn set_vector(&self, keys: &[String], amplitudes: Vec<Complex64>) -> KernelResult<()> {
        let record = Subsystem::new(keys.to_vec(), amplitudes)?;
        self.install(record);
        Ok(())
    }

    /// Drop `key`'s binding. Partner keys keep their record.
    pub fn remove(&self, key: &str) -> KernelResult<()> {
        match self.write().remove(key) {
            Some(_) => Ok(()),
            None => Err(KernelError::KeyAbsent(key.to_string())),
        }
    }

    /// Snapshot of every bound key.
    pub fn keys(&self) -> Vec<String> {
        self.read().keys().cloned().collect()
    }

    /// Repoint every key of `record` to it under the exclusive lock.
    fn install(&self, record: Subsystem) {
        let record = Arc::new(record);
        let mut states = self.write();
        for key in record.keys() {
            states.insert(key.clone(), Arc::clone(&record));
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, FxHashMap<String, Arc<Subsystem>>> {
        self.states.read().expect("state registry lock poisoned")
    }

    fn write(&self) -> RwLockWriteGuard<'_, FxHashMap<String, Arc<Subsystem>>> {
        self.states.write().expect("state registry lock poisoned")
    }
}
