//! Cooperative cancellation.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// A clonable cancellation flag.
///
/// Long-running loops (response waits, bulk transfers, metadata walks)
/// poll the token at their suspension points and exit cleanly when it
/// is set. A host application typically clones the token into its
/// Ctrl-C handler; the handler only sets the flag.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> CancelToken {
        CancelToken::default()
    }

    /// Requests cancellation. Safe to call from a signal handler.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    /// Clears the flag so the next operation starts fresh.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::Relaxed);
    }
}
