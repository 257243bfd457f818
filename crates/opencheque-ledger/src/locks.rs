//! Per-cheque write serialization.
//!
//! Every path that writes a cheque's status (settle, split, the expiry
//! sweep) takes that cheque's lock first. The store's compare-and-set
//! transition already rejects a lost race after the fact; holding the lock
//! keeps the race from happening at all, so a settlement that has moved
//! funds can never find its cheque swept to EXPIRED underneath it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use opencheque_types::ChequeId;

/// Registry of one mutex per cheque id, created on first use.
///
/// Entries are never removed; the registry lives and grows with the
/// process, like the cheque records themselves.
#[derive(Debug, Default)]
pub struct ChequeLocks {
    locks: Mutex<HashMap<ChequeId, Arc<Mutex<()>>>>,
}

impl ChequeLocks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The mutex guarding `id`. Callers hold the returned handle locked
    /// for the duration of their status write.
    #[must_use]
    pub fn lock_for(&self, id: ChequeId) -> Arc<Mutex<()>> {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(id)
            .or_default()
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn same_id_returns_same_lock() {
        let locks = ChequeLocks::new();
        let id = ChequeId::new();
        assert!(Arc::ptr_eq(&locks.lock_for(id), &locks.lock_for(id)));
    }

    #[test]
    fn distinct_ids_get_distinct_locks() {
        let locks = ChequeLocks::new();
        let a = locks.lock_for(ChequeId::new());
        let b = locks.lock_for(ChequeId::new());
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn lock_serializes_critical_sections() {
        let locks = ChequeLocks::new();
        let id = ChequeId::new();
        let value = AtomicUsize::new(0);

        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    let lock = locks.lock_for(id);
                    let _guard = lock.lock().unwrap();
                    // Deliberately non-atomic read-modify-write; only the
                    // lock keeps updates from being lost.
                    let read = value.load(Ordering::SeqCst);
                    std::thread::yield_now();
                    value.store(read + 1, Ordering::SeqCst);
                });
            }
        });

        assert_eq!(value.load(Ordering::SeqCst), 8);
    }
}
