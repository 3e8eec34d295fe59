//! Operator stop request.
//!
//! A single lock-free flag, raised from the console watcher thread (or a
//! test) and polled by the monitor loop between sleep slices.
//!
//! ```text
//! ┌──────────────┐  request_stop()  ┌──────────────┐  stop_requested()  ┌──────────────┐
//! │ Console / ^C │────────────────▶│ STOP (atomic)│◀──────────────────│ Monitor loop │
//! └──────────────┘                 └──────────────┘                    └──────────────┘
//! ```

use core::sync::atomic::{AtomicBool, Ordering};

use crate::app::ports::StopSignal;

static STOP_REQUESTED: AtomicBool = AtomicBool::new(false);

/// Ask the monitor loop to stop at its next check.
/// Lock-free; safe to call from any thread.
pub fn request_stop() {
    STOP_REQUESTED.store(true, Ordering::Release);
}

/// Re-arm the flag (start of a new monitoring session).
pub fn clear_stop() {
    STOP_REQUESTED.store(false, Ordering::Release);
}

pub fn is_stop_requested() -> bool {
    STOP_REQUESTED.load(Ordering::Acquire)
}

/// [`StopSignal`] backed by the process-wide flag.
#[derive(Debug, Default, Clone, Copy)]
pub struct GlobalStop;

impl StopSignal for GlobalStop {
    fn stop_requested(&self) -> bool {
        is_stop_requested()
    }
}
