//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the `log` facade (the ESP-IDF logger on device, which goes to UART /
//! USB-CDC).  The console sink covers the operator; this one covers the
//! serial log.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`].
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::CalibratorStateChanged { from, to } => {
                info!("CAL   | {:?} -> {:?}", from, to);
            }
            AppEvent::PointCaptured {
                buffer,
                raw_average,
                discarded,
            } => {
                info!(
                    "CAL   | {:?} buffer raw={:.2} discarded={}",
                    buffer, raw_average, discarded
                );
            }
            AppEvent::CalibrationPersisted(cfg) => {
                info!(
                    "CAL   | persisted slope={:.8} intercept={:.2} GPIO{}",
                    cfg.slope, cfg.intercept, cfg.adc_pin
                );
            }
            AppEvent::CalibrationFailed(e) => {
                warn!("CAL   | failed: {}", e);
            }
            AppEvent::Reading {
                timestamp_ms,
                reading: r,
            } => {
                info!(
                    "EC    | t={}ms raw={:.2} ec_raw={:.2} ec25={:.2}uS/cm T={:.1}\u{00b0}C ({:?}) discarded={}",
                    timestamp_ms,
                    r.raw_average,
                    r.ec_raw,
                    r.ec_compensated,
                    r.temperature_c,
                    r.temperature_source,
                    r.discarded_samples,
                );
            }
            AppEvent::ReadingFailed {
                timestamp_ms,
                error,
            } => {
                warn!("EC    | t={}ms reading failed: {}", timestamp_ms, error);
            }
            AppEvent::Stopped { readings_taken } => {
                info!("STOP  | after {} readings", readings_taken);
            }
        }
    }
}
