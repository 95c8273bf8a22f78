use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Process-wide train lock flag. Starts unlocked and is never persisted.
#[derive(Debug, Clone, Default)]
pub struct TrainLock {
    locked: Arc<AtomicBool>,
}

impl TrainLock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Acquire)
    }

    /// Last writer wins.
    pub fn set(&self, locked: bool) {
        self.locked.store(locked, Ordering::Release);
    }
}
