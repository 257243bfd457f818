//! Anti-replay nonce registry.
//!
//! Every sealed claim carries a single-use nonce. Settlement consumes it
//! exactly once; a second settlement attempt of the same cheque finds the
//! nonce already consumed and is rejected as a replay. The registry is
//! process-wide and in-memory, the same lifetime as the process keys: a
//! restart invalidates outstanding envelopes and their nonces together.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use opencheque_types::Nonce;

/// Process-wide set of consumed nonces.
///
/// [`reserve`](Self::reserve) is a single check-and-set under one lock
/// acquisition. A separate `is_consumed` read followed by a later `mark`
/// write would let two concurrent settlements of the same cheque both pass
/// the check before either marks the nonce.
#[derive(Debug, Default)]
pub struct NonceRegistry {
    consumed: Mutex<HashSet<Nonce>>,
}

impl NonceRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically mark `nonce` consumed.
    ///
    /// Returns `true` if this call consumed it, `false` if it was already
    /// consumed (a replay).
    pub fn reserve(&self, nonce: Nonce) -> bool {
        self.lock().insert(nonce)
    }

    /// Read-only peek. Verification uses this; it must never burn the
    /// nonce it inspects.
    #[must_use]
    pub fn is_consumed(&self, nonce: Nonce) -> bool {
        self.lock().contains(&nonce)
    }

    /// Drop a reservation. Only the settlement rollback path calls this,
    /// so an aborted transfer does not poison the cheque permanently.
    pub fn release(&self, nonce: Nonce) {
        self.lock().remove(&nonce);
    }

    /// Number of consumed nonces, for observability.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<Nonce>> {
        self.consumed.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opencheque_types::constants::NONCE_LEN;

    fn nonce(tag: u8) -> Nonce {
        Nonce::from_bytes([tag; NONCE_LEN])
    }

    #[test]
    fn first_reserve_wins_second_loses() {
        let registry = NonceRegistry::new();
        assert!(registry.reserve(nonce(1)));
        assert!(!registry.reserve(nonce(1)));
    }

    #[test]
    fn is_consumed_does_not_burn() {
        let registry = NonceRegistry::new();
        assert!(!registry.is_consumed(nonce(2)));
        assert!(!registry.is_consumed(nonce(2)));
        assert!(registry.reserve(nonce(2)));
        assert!(registry.is_consumed(nonce(2)));
    }

    #[test]
    fn release_reopens_the_nonce() {
        let registry = NonceRegistry::new();
        assert!(registry.reserve(nonce(3)));
        registry.release(nonce(3));
        assert!(!registry.is_consumed(nonce(3)));
        assert!(registry.reserve(nonce(3)));
    }

    #[test]
    fn distinct_nonces_do_not_collide() {
        let registry = NonceRegistry::new();
        assert!(registry.reserve(nonce(4)));
        assert!(registry.reserve(nonce(5)));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn concurrent_reserves_admit_exactly_one() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let registry = NonceRegistry::new();
        let winners = AtomicUsize::new(0);

        std::thread::scope(|scope| {
            for _ in 0..16 {
                scope.spawn(|| {
                    if registry.reserve(nonce(9)) {
                        winners.fetch_add(1, Ordering::SeqCst);
                    }
                });
            }
        });

        assert_eq!(winners.load(Ordering::SeqCst), 1);
    }
}
