//! Cheque record storage.
//!
//! Status is only ever written through [`ChequeStore::transition`], a
//! compare-and-set: the caller names the status it saw and the write fails
//! if the record has moved on since. Records are never deleted; a cheque
//! that leaves ISSUED stays queryable in its terminal status.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use opencheque_types::{Cheque, ChequeError, ChequeId, ChequeStatus, Result};

/// Where cheque records live.
pub trait ChequeStore: Send + Sync {
    /// Snapshot of the cheque record for `id`.
    fn fetch(&self, id: ChequeId) -> Result<Cheque>;

    /// Persist a newly issued cheque.
    fn insert(&self, cheque: Cheque) -> Result<()>;

    /// Compare-and-set status write: succeeds only if the stored status
    /// still equals `expected` and the status machine allows
    /// `expected -> target`.
    ///
    /// # Errors
    ///
    /// Returns [`ChequeError::InvalidState`] carrying the status actually
    /// found when the record has moved on since the caller observed it.
    fn transition(
        &self,
        id: ChequeId,
        expected: ChequeStatus,
        target: ChequeStatus,
    ) -> Result<()>;

    /// Insert `children` and move the parent ISSUED -> SPLIT in one atomic
    /// step. On any failure nothing is persisted, so a retry starts from
    /// an untouched parent rather than duplicating children.
    fn commit_split(&self, parent_id: ChequeId, children: Vec<Cheque>) -> Result<()>;

    /// Snapshot of every cheque currently in ISSUED status.
    fn issued(&self) -> Result<Vec<Cheque>>;
}

/// In-memory [`ChequeStore`] keyed by cheque id.
#[derive(Debug, Default)]
pub struct MemoryChequeStore {
    cheques: RwLock<HashMap<ChequeId, Cheque>>,
}

impl MemoryChequeStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<ChequeId, Cheque>> {
        self.cheques.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<ChequeId, Cheque>> {
        self.cheques.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ChequeStore for MemoryChequeStore {
    fn fetch(&self, id: ChequeId) -> Result<Cheque> {
        self.read()
            .get(&id)
            .cloned()
            .ok_or(ChequeError::ChequeNotFound(id))
    }

    fn insert(&self, cheque: Cheque) -> Result<()> {
        let mut cheques = self.write();
        if cheques.contains_key(&cheque.id) {
            return Err(ChequeError::InvalidOperation {
                reason: format!("cheque already exists: {}", cheque.id),
            });
        }
        cheques.insert(cheque.id, cheque);
        Ok(())
    }

    fn transition(
        &self,
        id: ChequeId,
        expected: ChequeStatus,
        target: ChequeStatus,
    ) -> Result<()> {
        let mut cheques = self.write();
        let cheque = cheques
            .get_mut(&id)
            .ok_or(ChequeError::ChequeNotFound(id))?;
        if cheque.status != expected {
            return Err(ChequeError::InvalidState {
                current: cheque.status,
            });
        }
        match target {
            ChequeStatus::Cleared => cheque.mark_cleared(),
            ChequeStatus::Split => cheque.mark_split(),
            ChequeStatus::Expired => cheque.mark_expired(),
            // Nothing transitions back into ISSUED.
            ChequeStatus::Issued => Err(ChequeError::InvalidState {
                current: cheque.status,
            }),
        }
    }

    fn commit_split(&self, parent_id: ChequeId, children: Vec<Cheque>) -> Result<()> {
        let mut cheques = self.write();
        let parent = cheques
            .get_mut(&parent_id)
            .ok_or(ChequeError::ChequeNotFound(parent_id))?;
        // Fails before any child is stored if the parent already left
        // ISSUED, so a lost race persists nothing.
        parent.mark_split()?;
        for child in children {
            cheques.insert(child.id, child);
        }
        Ok(())
    }

    fn issued(&self) -> Result<Vec<Cheque>> {
        Ok(self
            .read()
            .values()
            .filter(|cheque| cheque.status == ChequeStatus::Issued)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn dec(n: i64) -> Decimal {
        Decimal::new(n, 0)
    }

    #[test]
    fn insert_then_fetch_roundtrip() {
        let store = MemoryChequeStore::new();
        let cheque = Cheque::dummy("alice", "bob", dec(500));
        let id = cheque.id;
        store.insert(cheque).unwrap();

        let fetched = store.fetch(id).unwrap();
        assert_eq!(fetched.id, id);
        assert_eq!(fetched.status, ChequeStatus::Issued);
    }

    #[test]
    fn fetch_unknown_cheque_fails() {
        let store = MemoryChequeStore::new();
        let err = store.fetch(ChequeId::new()).unwrap_err();
        assert!(matches!(err, ChequeError::ChequeNotFound(_)));
    }

    #[test]
    fn insert_duplicate_id_fails() {
        let store = MemoryChequeStore::new();
        let cheque = Cheque::dummy("alice", "bob", dec(500));
        store.insert(cheque.clone()).unwrap();

        let err = store.insert(cheque).unwrap_err();
        assert!(matches!(err, ChequeError::InvalidOperation { .. }));
    }

    #[test]
    fn transition_from_expected_status_succeeds() {
        let store = MemoryChequeStore::new();
        let cheque = Cheque::dummy("alice", "bob", dec(500));
        let id = cheque.id;
        store.insert(cheque).unwrap();

        store
            .transition(id, ChequeStatus::Issued, ChequeStatus::Cleared)
            .unwrap();
        assert_eq!(store.fetch(id).unwrap().status, ChequeStatus::Cleared);
    }

    #[test]
    fn transition_reports_actual_status_on_lost_race() {
        let store = MemoryChequeStore::new();
        let cheque = Cheque::dummy("alice", "bob", dec(500));
        let id = cheque.id;
        store.insert(cheque).unwrap();

        store
            .transition(id, ChequeStatus::Issued, ChequeStatus::Cleared)
            .unwrap();
        let err = store
            .transition(id, ChequeStatus::Issued, ChequeStatus::Expired)
            .unwrap_err();
        assert!(matches!(
            err,
            ChequeError::InvalidState {
                current: ChequeStatus::Cleared
            }
        ));
    }

    #[test]
    fn transition_unknown_cheque_fails() {
        let store = MemoryChequeStore::new();
        let err = store
            .transition(ChequeId::new(), ChequeStatus::Issued, ChequeStatus::Cleared)
            .unwrap_err();
        assert!(matches!(err, ChequeError::ChequeNotFound(_)));
    }

    #[test]
    fn commit_split_stores_children_and_marks_parent() {
        let store = MemoryChequeStore::new();
        let parent = Cheque::dummy("alice", "bob", dec(1000));
        let parent_id = parent.id;
        store.insert(parent).unwrap();

        let children = vec![
            Cheque::dummy("alice", "bob", dec(400)),
            Cheque::dummy("alice", "bob", dec(600)),
        ];
        let child_ids: Vec<ChequeId> = children.iter().map(|c| c.id).collect();

        store.commit_split(parent_id, children).unwrap();

        assert_eq!(store.fetch(parent_id).unwrap().status, ChequeStatus::Split);
        for id in child_ids {
            assert_eq!(store.fetch(id).unwrap().status, ChequeStatus::Issued);
        }
    }

    #[test]
    fn commit_split_on_cleared_parent_stores_nothing() {
        let store = MemoryChequeStore::new();
        let parent = Cheque::dummy("alice", "bob", dec(1000));
        let parent_id = parent.id;
        store.insert(parent).unwrap();
        store
            .transition(parent_id, ChequeStatus::Issued, ChequeStatus::Cleared)
            .unwrap();

        let child = Cheque::dummy("alice", "bob", dec(1000));
        let child_id = child.id;
        let err = store.commit_split(parent_id, vec![child]).unwrap_err();

        assert!(matches!(
            err,
            ChequeError::InvalidState {
                current: ChequeStatus::Cleared
            }
        ));
        assert!(store.fetch(child_id).is_err());
    }

    #[test]
    fn issued_lists_only_issued_cheques() {
        let store = MemoryChequeStore::new();
        let keep = Cheque::dummy("alice", "bob", dec(100));
        let clear = Cheque::dummy("alice", "bob", dec(200));
        let keep_id = keep.id;
        let clear_id = clear.id;
        store.insert(keep).unwrap();
        store.insert(clear).unwrap();
        store
            .transition(clear_id, ChequeStatus::Issued, ChequeStatus::Cleared)
            .unwrap();

        let issued = store.issued().unwrap();
        assert_eq!(issued.len(), 1);
        assert_eq!(issued[0].id, keep_id);
    }

    #[test]
    fn concurrent_cas_admits_exactly_one_writer() {
        let store = MemoryChequeStore::new();
        let cheque = Cheque::dummy("alice", "bob", dec(500));
        let id = cheque.id;
        store.insert(cheque).unwrap();

        let wins = AtomicUsize::new(0);
        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    if store
                        .transition(id, ChequeStatus::Issued, ChequeStatus::Cleared)
                        .is_ok()
                    {
                        wins.fetch_add(1, Ordering::SeqCst);
                    }
                });
            }
        });

        assert_eq!(wins.load(Ordering::SeqCst), 1);
        assert_eq!(store.fetch(id).unwrap().status, ChequeStatus::Cleared);
    }
}
