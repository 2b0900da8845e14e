//! Commit gate shared between a pending write and the caller waiting on it.
//!
//! A write that outlives its caller's timeout must not land. The writer
//! claims the gate immediately before it commits; the caller abandons it when
//! the timeout fires. Exactly one of the two wins.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use crate::error::{Result, StoreError};

const PENDING: u8 = 0;
const CLAIMED: u8 = 1;
const ABANDONED: u8 = 2;

/// Decides whether a write may still commit.
#[derive(Debug, Clone, Default)]
pub struct CommitGate {
    state: Arc<AtomicU8>,
}

impl CommitGate {
    /// A fresh gate that lets the write through until it is abandoned.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the right to commit.
    ///
    /// Must be called after every check that can fail and right before the
    /// write itself, while holding the store's write lock.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Unavailable` if the caller already gave up.
    pub fn claim(&self) -> Result<()> {
        match self
            .state
            .compare_exchange(PENDING, CLAIMED, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) | Err(CLAIMED) => Ok(()),
            Err(_) => Err(StoreError::Unavailable(
                "write abandoned after timeout".to_string(),
            )),
        }
    }

    /// Give up on the write. Returns `false` if it was already claimed and
    /// will commit regardless.
    #[must_use]
    pub fn abandon(&self) -> bool {
        self.state
            .compare_exchange(PENDING, ABANDONED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claim_then_abandon_keeps_the_write() {
        let gate = CommitGate::new();
        let writer = gate.clone();

        writer.claim().unwrap();
        assert!(!gate.abandon());
    }

    #[test]
    fn abandoned_gate_refuses_claim() {
        let gate = CommitGate::new();
        let writer = gate.clone();

        assert!(gate.abandon());
        assert!(matches!(writer.claim(), Err(StoreError::Unavailable(_))));
    }

    #[test]
    fn repeated_claim_is_allowed() {
        let gate = CommitGate::new();
        gate.claim().unwrap();
        gate.claim().unwrap();
    }
}
