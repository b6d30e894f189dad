//! Cooperative stop signal for a run

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cloneable flag the caller raises to halt a run.
///
/// The runner checks it at the top of every cycle and the detector between
/// polls, so a raised stop takes effect at the next boundary.
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    raised: Arc<AtomicBool>,
}

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&self) {
        self.raised.store(true, Ordering::SeqCst);
    }

    pub fn is_raised(&self) -> bool {
        self.raised.load(Ordering::SeqCst)
    }
}
