//! Outbound application events.
//!
//! The calibrator and the monitor emit these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them: log to serial, print an
//! append-only reading line, record them in a test.

use crate::config::CalibrationConfig;
use crate::error::{CalibrationError, SensorError};

use super::calibrator::{CalibratorState, ReferenceBuffer};
use super::monitor::EcReading;

/// Structured events emitted by the application core.
#[derive(Debug, Clone)]
pub enum AppEvent {
    // ── Calibrator ───────────────────────────────────────────
    /// The calibrator moved between states.
    CalibratorStateChanged {
        from: CalibratorState,
        to: CalibratorState,
    },

    /// A reference buffer was sampled.
    PointCaptured {
        buffer: ReferenceBuffer,
        raw_average: f32,
        discarded: u16,
    },

    /// A calibration was fitted and written to the store.
    CalibrationPersisted(CalibrationConfig),

    /// The calibration run ended without writing anything.
    CalibrationFailed(CalibrationError),

    // ── Monitor ──────────────────────────────────────────────
    /// One scheduled measurement.
    Reading {
        /// Clock reading (ms since boot) when the measurement was taken.
        timestamp_ms: u64,
        reading: EcReading,
    },

    /// A scheduled measurement failed; the loop carries on.
    ReadingFailed { timestamp_ms: u64, error: SensorError },

    /// The monitor loop exited on operator request.
    Stopped { readings_taken: u64 },
}
