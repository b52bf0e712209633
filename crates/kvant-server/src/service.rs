//! Shared service state handed to every connection worker.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use kvant_kernel::{QuantumKernel, StateRegistry};

use crate::config::ServerConfig;
use crate::locks::KeyLockTable;

/// Everything the connection workers share: the registry, the kernel with
/// its cache bank, the per-key lock table, and the shutdown flag. Created
/// once at server start; no globals.
pub struct Service {
    config: ServerConfig,
    registry: Arc<StateRegistry>,
    kernel: QuantumKernel,
    locks: KeyLockTable,
    shutdown: AtomicBool,
}

impl Service {
    pub fn new(config: ServerConfig) -> Self {
        let registry = Arc::new(StateRegistry::new());
        let kernel = QuantumKernel::new(Arc::clone(&registry), config.cache_capacity);
        Self {
            config,
            registry,
            kernel,
            locks: KeyLockTable::new(),
            shutdown: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn registry(&self) -> &StateRegistry {
        &self.registry
    }

    pub fn kernel(&self) -> &QuantumKernel {
        &self.kernel
    }

    pub fn locks(&self) -> &KeyLockTable {
        &self.locks
    }

    /// Ask the listener to stop accepting connections.
    pub fn request_shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    pub fn shutdown_requested(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    /// Nudge the blocking accept loop after a shutdown request.
    pub fn wake_listener(&self) {
        let _ = std::net::TcpStream::connect(self.config.socket_addr());
    }

    /// The enlarged key set for a request: the sorted union of every
    /// declared key's current partner keys. Declared keys with no binding
    /// get their lock-table entry created but join no union.
    pub fn enlarged_key_set(&self, declared: &[String]) -> Vec<String> {
        let mut all_keys: Vec<String> = Vec::new();
        for key in declared {
            match self.registry.get(key) {
                Ok(record) => {
                    for partner in record.keys() {
                        if !all_keys.iter().any(|k| k == partner) {
                            all_keys.push(partner.clone());
                        }
                    }
                }
                Err(_) => {
                    self.locks.entry(key);
                }
            }
        }
        all_keys.sort();
        all_keys
    }

    /// Re-check pass run with the locks held: whether every declared key's
    /// record still falls inside the sorted `held` set. A false result
    /// means another request grew a compound system between enlargement and
    /// acquisition, and the caller must release and retry.
    pub fn enlargement_covers(&self, declared: &[String], held: &[String]) -> bool {
        for key in declared {
            if let Ok(record) = self.registry.get(key) {
                for partner in record.keys() {
                    if held.binary_search(partner).is_err() {
                        return false;
                    }
                }
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> Service {
        Service::new(ServerConfig::new(
            "127.0.0.1".parse().unwrap(),
            2000,
            1,
            "ket_vector".to_string(),
            None,
        ))
    }

    fn keys(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn enlargement_unions_partner_keys_sorted() {
        let service = service();
        service
            .registry()
            .set_amplitudes(
                &keys(&["c", "a"]),
                &[1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
            )
            .unwrap();

        let enlarged = service.enlarged_key_set(&keys(&["c"]));
        assert_eq!(enlarged, keys(&["a", "c"]));
    }

    #[test]
    fn unbound_keys_get_lock_entries_but_no_union() {
        let service = service();
        let enlarged = service.enlarged_key_set(&keys(&["fresh"]));
        assert!(enlarged.is_empty());
        assert_eq!(service.locks().len(), 1);
    }

    #[test]
    fn recheck_spots_a_grown_record() {
        let service = service();
        service
            .registry()
            .set_amplitudes(&keys(&["a"]), &[1.0, 0.0, 0.0, 0.0])
            .unwrap();
        let held = service.enlarged_key_set(&keys(&["a"]));
        assert_eq!(held, keys(&["a"]));
        assert!(service.enlargement_covers(&keys(&["a"]), &held));

        // Another request entangles "a" with "b" in between.
        service
            .registry()
            .set_amplitudes(
                &keys(&["a", "b"]),
                &[1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
            )
            .unwrap();
        assert!(!service.enlargement_covers(&keys(&["a"]), &held));
    }
}
