use super::particle::GlobalBest;
use crossbeam::atomic::AtomicCell;
use std::sync::{Mutex, PoisonError};

/// Global best shared by particles evaluated on a thread pool.
///
/// Updates are strictly improving. The cost is read without locking so most
/// losing offers never touch the mutex; the lock is only held while a winning
/// position is copied in.
pub struct SharedBest {
    cost: AtomicCell<f64>,
    position: Mutex<Vec<f64>>,
}

impl SharedBest {
    pub fn new(best: GlobalBest) -> Self {
        Self {
            cost: AtomicCell::new(best.cost),
            position: Mutex::new(best.position),
        }
    }

    #[inline]
    pub fn cost(&self) -> f64 {
        self.cost.load()
    }

    /// Snapshot of the current best position
    pub fn position(&self) -> Vec<f64> {
        self.position
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Publish `position` if `cost` is strictly below the current best.
    /// Returns whether the offer won.
    pub fn offer(&self, position: &[f64], cost: f64) -> bool {
        if !(cost < self.cost.load()) {
            return false;
        }

        let mut guard = self.position.lock().unwrap_or_else(PoisonError::into_inner);
        // Another thread may have won while we waited for the lock
        if !(cost < self.cost.load()) {
            return false;
        }
        guard.clear();
        guard.extend_from_slice(position);
        self.cost.store(cost);
        true
    }

    pub fn into_inner(self) -> GlobalBest {
        GlobalBest {
            cost: self.cost.into_inner(),
            position: self
                .position
                .into_inner()
                .unwrap_or_else(PoisonError::into_inner),
        }
    }
}
