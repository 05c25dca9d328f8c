use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Stop request shared between the Ctrl-C handler and the dispatch loop.
///
/// The loop polls it between units, so a unit is never half processed
/// when the run stops.
#[derive(Debug, Clone, Default)]
pub struct SignalOfStop {
    // Shared state between clones
    closing: Arc<AtomicBool>,
}

impl SignalOfStop {
    pub fn new() -> SignalOfStop {
        SignalOfStop::default()
    }

    pub fn cancel(&self) {
        self.closing.store(true, Ordering::Relaxed);
    }

    pub fn cancelled(&self) -> bool {
        self.closing.load(Ordering::Relaxed)
    }
}
