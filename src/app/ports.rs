//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Calibrator / Monitor (domain)
//! ```
//!
//! Driven adapters (probe ADC, temperature sensor, operator console,
//! calibration store, clock, event sinks) implement these traits.  The
//! domain consumes them via generics, so the calibration and measurement
//! logic never touches hardware directly.
//!
//! The inter-sample delay is not a port of its own: it is
//! [`embedded_hal::delay::DelayNs`], so any HAL delay (or a test fake)
//! plugs straight in.

use crate::config::CalibrationConfig;
use crate::error::{ConfigError, SensorError};

// ───────────────────────────────────────────────────────────────
// Probe port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// One analog input channel wired to the EC probe.
pub trait AdcPort {
    /// Take a single raw conversion.
    fn read_raw(&mut self) -> Result<u16, SensorError>;

    /// GPIO the channel is bound to (for diagnostics).
    fn pin(&self) -> i32;
}

// ───────────────────────────────────────────────────────────────
// Temperature port
// ───────────────────────────────────────────────────────────────

/// Optional onboard temperature sensor.
///
/// `None` means no live reading is available; callers fall back to the
/// reference temperature and flag the reading accordingly.
pub trait TemperaturePort {
    fn read_celsius(&mut self) -> Option<f32>;
}

// ───────────────────────────────────────────────────────────────
// Operator port (driving adapter: operator → calibrator)
// ───────────────────────────────────────────────────────────────

/// Blocking operator confirmation.
pub trait Confirmer {
    /// Show `message` and block until the operator acknowledges.
    /// Returns `false` if the operator declined.
    fn confirm(&mut self, message: &str) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists the calibration record.
///
/// Implementations MUST validate before persisting and MUST replace the
/// previous record atomically: a reader sees either the old record or the
/// new one, never a torn write.
pub trait ConfigPort {
    /// Load and validate the stored calibration.
    /// Returns [`ConfigError::Missing`] if nothing has been stored yet.
    fn load(&self) -> Result<CalibrationConfig, ConfigError>;

    /// Validate and persist, overwriting any previous record.
    fn save(&mut self, config: &CalibrationConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Monotonic time source that can also suspend the caller.
///
/// The monitor loop only ever waits through this trait, so tests can
/// substitute a virtual clock and run hours of schedule instantly.
pub trait Clock {
    /// Milliseconds since an arbitrary fixed origin (boot on device).
    fn now_ms(&self) -> u64;

    /// Suspend for `ms` milliseconds.
    fn sleep_ms(&mut self, ms: u64);
}

// ───────────────────────────────────────────────────────────────
// Stop signal
// ───────────────────────────────────────────────────────────────

/// Operator-initiated stop request, polled between sleeps.
pub trait StopSignal {
    fn stop_requested(&self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → console / logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go (serial log,
/// stdout line stream, test recorder).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Scheduler delegate (decouples scheduler from the monitor)
// ───────────────────────────────────────────────────────────────

/// Callback trait that the scheduler invokes when a schedule fires.
///
/// This decouples the [`Scheduler`](crate::scheduler::Scheduler) from
/// whatever work is triggered.  The monitor loop implements it to take a
/// reading; the scheduler itself knows nothing about probes.
pub trait SchedulerDelegate {
    /// Called when a schedule fires.
    ///
    /// * `label` — the human-readable label of the schedule that fired.
    /// * `now_ms` — the clock reading at which it fired.
    fn on_schedule_fired(&mut self, label: &str, now_ms: u64);
}

/// Fan one event stream out to two sinks (e.g. serial log + console).
impl<A: EventSink, B: EventSink> EventSink for (A, B) {
    fn emit(&mut self, event: &super::events::AppEvent) {
        self.0.emit(event);
        self.1.emit(event);
    }
}
