//! Two-point calibration of the EC probe.
//!
//! The operator places the probe in the low (1413 µS/cm) and then the high
//! (12.88 mS/cm) reference buffer.  Each buffer is confirmed, sampled and
//! averaged; the two points define the line
//!
//! ```text
//!   ec = slope * raw + intercept
//! ```
//!
//! which is written to the configuration store in one piece.  Nothing is
//! written unless every step succeeds.
//!
//! ```text
//!  Idle ─▶ AwaitingConfirmation(Low) ─▶ Sampling(Low)
//!       ─▶ AwaitingConfirmation(High) ─▶ Sampling(High)
//!       ─▶ Computing ─▶ Persisted
//!                 (any step) ─▶ Faulted
//! ```

use embedded_hal::delay::DelayNs;
use heapless::Vec;
use log::{info, warn};

use crate::config::{CalibrationConfig, HIGH_POINT_US_CM, LOW_POINT_US_CM, SamplingConfig};
use crate::error::CalibrationError;
use crate::sampling::average_samples;

use super::events::AppEvent;
use super::ports::{AdcPort, ConfigPort, Confirmer, EventSink};

// ───────────────────────────────────────────────────────────────
// Reference buffers and points
// ───────────────────────────────────────────────────────────────

/// The two calibration solutions, in the order they are presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceBuffer {
    Low,
    High,
}

impl ReferenceBuffer {
    pub const ORDER: [Self; 2] = [Self::Low, Self::High];

    /// Conductivity of the buffer in µS/cm.
    pub const fn us_cm(self) -> f32 {
        match self {
            Self::Low => LOW_POINT_US_CM,
            Self::High => HIGH_POINT_US_CM,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Low => "1413 µS/cm",
            Self::High => "12.88 mS/cm",
        }
    }

    /// Operator instruction shown before the buffer is sampled.
    pub const fn prompt(self) -> &'static str {
        match self {
            Self::Low => {
                "Place the probe in the 1413 µS/cm buffer solution. Ensure the sensor is still \
                 and wait for the reading to stabilise."
            }
            Self::High => {
                "Rinse the probe, dry it carefully, then place it in the 12.88 mS/cm buffer."
            }
        }
    }
}

/// An averaged raw reading taken in a buffer of known conductivity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationPoint {
    pub raw_reading: f32,
    pub reference_value: f32,
}

/// Slope/intercept pair.  Only ever produced together.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f32,
    pub intercept: f32,
}

impl LinearFit {
    pub fn apply(&self, raw: f32) -> f32 {
        self.slope * raw + self.intercept
    }
}

/// Exact line through two calibration points.
///
/// Identical raw readings (probe not moved, or disconnected) are rejected
/// before dividing.
pub fn fit_two_point(
    low: CalibrationPoint,
    high: CalibrationPoint,
) -> Result<LinearFit, CalibrationError> {
    let span = high.raw_reading - low.raw_reading;
    if span == 0.0 || !span.is_finite() {
        return Err(CalibrationError::DegenerateReadings);
    }

    let slope = (high.reference_value - low.reference_value) / span;
    let intercept = low.reference_value - slope * low.raw_reading;
    if !slope.is_finite() || !intercept.is_finite() {
        return Err(CalibrationError::DegenerateReadings);
    }

    Ok(LinearFit { slope, intercept })
}

// ───────────────────────────────────────────────────────────────
// Calibrator
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibratorState {
    Idle,
    AwaitingConfirmation(ReferenceBuffer),
    Sampling(ReferenceBuffer),
    Computing,
    /// Terminal: calibration written.
    Persisted,
    /// Terminal: run aborted, store untouched.
    Faulted,
}

/// Drives one operator-guided two-point calibration.
pub struct Calibrator {
    sampling: SamplingConfig,
    state: CalibratorState,
    points: Vec<CalibrationPoint, 2>,
}

impl Calibrator {
    pub fn new(sampling: SamplingConfig) -> Self {
        Self {
            sampling,
            state: CalibratorState::Idle,
            points: Vec::new(),
        }
    }

    pub fn state(&self) -> CalibratorState {
        self.state
    }

    /// Points captured by the most recent run, low buffer first.
    pub fn points(&self) -> &[CalibrationPoint] {
        &self.points
    }

    /// Run the full procedure and persist the result.
    ///
    /// On any error the calibrator ends in [`CalibratorState::Faulted`] and
    /// `store` is not written.
    pub fn run_calibration(
        &mut self,
        adc: &mut impl AdcPort,
        delay: &mut impl DelayNs,
        confirmer: &mut impl Confirmer,
        store: &mut impl ConfigPort,
        sink: &mut impl EventSink,
    ) -> Result<CalibrationConfig, CalibrationError> {
        self.points.clear();
        self.state = CalibratorState::Idle;

        match self.calibrate(adc, delay, confirmer, store, sink) {
            Ok(config) => {
                self.transition(CalibratorState::Persisted, sink);
                info!(
                    "Calibration complete: slope={:.8} intercept={:.2}",
                    config.slope, config.intercept
                );
                sink.emit(&AppEvent::CalibrationPersisted(config.clone()));
                Ok(config)
            }
            Err(e) => {
                self.transition(CalibratorState::Faulted, sink);
                warn!("Calibration failed: {}", e);
                sink.emit(&AppEvent::CalibrationFailed(e));
                Err(e)
            }
        }
    }

    fn calibrate(
        &mut self,
        adc: &mut impl AdcPort,
        delay: &mut impl DelayNs,
        confirmer: &mut impl Confirmer,
        store: &mut impl ConfigPort,
        sink: &mut impl EventSink,
    ) -> Result<CalibrationConfig, CalibrationError> {
        self.sampling
            .validate()
            .map_err(CalibrationError::InvalidSampling)?;

        for buffer in ReferenceBuffer::ORDER {
            self.transition(CalibratorState::AwaitingConfirmation(buffer), sink);
            if !confirmer.confirm(buffer.prompt()) {
                return Err(CalibrationError::Cancelled);
            }

            self.transition(CalibratorState::Sampling(buffer), sink);
            let avg = average_samples(
                adc,
                delay,
                self.sampling.samples,
                self.sampling.sample_delay_ms,
            )?;
            info!("Raw ADC average ({}): {:.2}", buffer.label(), avg.mean);
            sink.emit(&AppEvent::PointCaptured {
                buffer,
                raw_average: avg.mean,
                discarded: avg.discarded,
            });

            let pushed = self.points.push(CalibrationPoint {
                raw_reading: avg.mean,
                reference_value: buffer.us_cm(),
            });
            debug_assert!(pushed.is_ok(), "more points than reference buffers");
        }

        self.transition(CalibratorState::Computing, sink);
        let (low, high) = (self.points[0], self.points[1]);
        let fit = fit_two_point(low, high)?;
        if fit.slope < 0.0 {
            warn!("Negative slope: the high buffer read lower than the low buffer");
        }

        let mut config = CalibrationConfig::new(self.sampling, fit.slope, fit.intercept);
        config.raw_low = Some(low.raw_reading);
        config.raw_high = Some(high.raw_reading);
        config.low_point_us_cm = Some(low.reference_value);
        config.high_point_us_cm = Some(high.reference_value);
        config.validate()?;

        store.save(&config)?;
        Ok(config)
    }

    fn transition(&mut self, to: CalibratorState, sink: &mut impl EventSink) {
        let from = self.state;
        if from != to {
            self.state = to;
            sink.emit(&AppEvent::CalibratorStateChanged { from, to });
        }
    }
}
