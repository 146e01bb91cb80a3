use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// One-shot cancellation flag shared between the playback loop and whatever
/// wants to stop it. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct PlaybackSignal {
    raised: Arc<AtomicBool>,
}

impl PlaybackSignal {
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
