//! Latest-value status publication.
//!
//! The control loop publishes a [`MotionStatus`] every N cycles; readers on
//! other threads take a copy without touching the orchestrator.

use std::sync::{Arc, PoisonError, RwLock};

use xxcnc_common::motion::status::MotionStatus;

#[derive(Debug, Default)]
struct Slot {
    status: MotionStatus,
    /// Number of publishes so far.
    sequence: u64,
}

/// Cloneable handle to a single status slot. Last write wins.
#[derive(Debug, Clone, Default)]
pub struct StatusBoard {
    slot: Arc<RwLock<Slot>>,
}

impl StatusBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, status: &MotionStatus) {
        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        slot.status.clone_from(status);
        slot.sequence += 1;
    }

    pub fn latest(&self) -> MotionStatus {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .status
            .clone()
    }

    /// Publish count; lets readers skip unchanged snapshots.
    pub fn sequence(&self) -> u64 {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .sequence
    }
}
