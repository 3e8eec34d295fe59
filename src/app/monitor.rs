//! Temperature-compensated EC monitoring.
//!
//! [`Monitor`] holds a validated [`CalibrationConfig`] and turns an
//! averaged probe reading into conductivity normalised to 25 °C:
//!
//! ```text
//!   ec_raw         = slope * raw_average + intercept
//!   ec_compensated = ec_raw / (1 + α · (T − 25))
//! ```
//!
//! [`Monitor::run_forever`] repeats this once an hour through the
//! [`Scheduler`] until the stop signal is raised.  A failed reading is
//! reported and skipped; it never ends the loop.  The monitor only ever
//! reads the configuration store.

use embedded_hal::delay::DelayNs;
use log::{debug, info, warn};

use crate::config::{CalibrationConfig, READING_INTERVAL_MS, REFERENCE_TEMP_C, TEMP_COEFFICIENT};
use crate::error::{ConfigError, SensorError};
use crate::sampling::average_samples;
use crate::scheduler::{Schedule, Scheduler};

use super::events::AppEvent;
use super::ports::{
    AdcPort, Clock, ConfigPort, EventSink, SchedulerDelegate, StopSignal, TemperaturePort,
};

/// Longest single sleep; bounds how late a stop request is noticed.
pub const MAX_SLEEP_SLICE_MS: u64 = 1000;

/// Plausible range for the on-chip temperature sensor.  Anything outside
/// is treated as no reading at all.
pub const TEMP_MIN_C: f32 = -10.0;
pub const TEMP_MAX_C: f32 = 85.0;

const READING_SCHEDULE: &str = "ec-reading";

/// Normalise an uncompensated EC value to the 25 °C reference.
pub fn compensate(ec_raw: f32, temperature_c: f32) -> f32 {
    ec_raw / (1.0 + TEMP_COEFFICIENT * (temperature_c - REFERENCE_TEMP_C))
}

/// Which temperature went into the compensation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemperatureSource {
    /// Live reading from the onboard sensor.
    Live,
    /// Sensor unavailable; the 25 °C reference was used, so the value is
    /// effectively uncompensated.
    Fallback,
}

/// One compensated measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EcReading {
    pub raw_average: f32,
    /// µS/cm before temperature compensation.
    pub ec_raw: f32,
    /// µS/cm normalised to 25 °C.
    pub ec_compensated: f32,
    pub temperature_c: f32,
    pub temperature_source: TemperatureSource,
    /// Samples dropped from the averaging window.
    pub discarded_samples: u16,
}

impl EcReading {
    pub fn is_live_compensated(&self) -> bool {
        self.temperature_source == TemperatureSource::Live
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Idle,
    Sampling,
    Computing,
    /// Last reading failed; the next scheduled reading is still taken.
    Faulted,
    /// Terminal: stopped by the operator.
    Stopped,
}

pub struct Monitor {
    config: CalibrationConfig,
    interval_ms: u64,
    state: MonitorState,
    readings_taken: u64,
    failed_readings: u64,
}

impl Monitor {
    pub fn new(config: CalibrationConfig) -> Self {
        Self {
            config,
            interval_ms: READING_INTERVAL_MS,
            state: MonitorState::Idle,
            readings_taken: 0,
            failed_readings: 0,
        }
    }

    /// Override the hourly reading interval.
    pub fn with_interval_ms(mut self, interval_ms: u64) -> Self {
        self.interval_ms = interval_ms.max(1);
        self
    }

    /// Load and validate the stored calibration.
    ///
    /// A missing file, an unparseable file, or a record without both slope
    /// and intercept all fail here, before any sampling.
    pub fn load_config(store: &impl ConfigPort) -> Result<CalibrationConfig, ConfigError> {
        let config = store.load()?;
        info!(
            "Monitor: calibration loaded (GPIO{}, {} samples @ {} ms, slope={:.8}, intercept={:.2})",
            config.adc_pin, config.samples, config.sample_delay_ms, config.slope, config.intercept
        );
        Ok(config)
    }

    pub fn from_store(store: &impl ConfigPort) -> Result<Self, ConfigError> {
        Self::load_config(store).map(Self::new)
    }

    pub fn config(&self) -> &CalibrationConfig {
        &self.config
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    pub fn readings_taken(&self) -> u64 {
        self.readings_taken
    }

    pub fn failed_readings(&self) -> u64 {
        self.failed_readings
    }

    /// Take one averaged, calibrated, temperature-compensated reading.
    pub fn read_once(
        &mut self,
        adc: &mut impl AdcPort,
        temp: &mut impl TemperaturePort,
        delay: &mut impl DelayNs,
    ) -> Result<EcReading, SensorError> {
        self.state = MonitorState::Sampling;
        let avg = match average_samples(
            adc,
            delay,
            self.config.samples,
            self.config.sample_delay_ms,
        ) {
            Ok(avg) => avg,
            Err(e) => {
                self.state = MonitorState::Faulted;
                self.failed_readings += 1;
                return Err(e);
            }
        };

        self.state = MonitorState::Computing;
        let (temperature_c, temperature_source) = match temp.read_celsius() {
            Some(t) if t.is_finite() && (TEMP_MIN_C..=TEMP_MAX_C).contains(&t) => {
                (t, TemperatureSource::Live)
            }
            other => {
                debug!("Temperature unavailable ({:?}); using reference", other);
                (REFERENCE_TEMP_C, TemperatureSource::Fallback)
            }
        };

        let ec_raw = self.config.apply(avg.mean);
        let reading = EcReading {
            raw_average: avg.mean,
            ec_raw,
            ec_compensated: compensate(ec_raw, temperature_c),
            temperature_c,
            temperature_source,
            discarded_samples: avg.discarded,
        };

        self.state = MonitorState::Idle;
        self.readings_taken += 1;
        Ok(reading)
    }

    /// Read once now and then every interval until `stop` is raised.
    ///
    /// Returns the terminal state, which is always [`MonitorState::Stopped`].
    pub fn run_forever(
        &mut self,
        adc: &mut impl AdcPort,
        temp: &mut impl TemperaturePort,
        delay: &mut impl DelayNs,
        clock: &mut impl Clock,
        stop: &impl StopSignal,
        sink: &mut impl EventSink,
    ) -> MonitorState {
        let mut scheduler = Scheduler::new(clock.now_ms());
        scheduler.add(Schedule {
            label: READING_SCHEDULE,
            interval_ms: self.interval_ms,
            fire_immediately: true,
        });
        info!("Monitor: reading every {} s", self.interval_ms / 1000);

        while !stop.stop_requested() {
            let mut tick = ScheduledReading {
                monitor: &mut *self,
                adc: &mut *adc,
                temp: &mut *temp,
                delay: &mut *delay,
                sink: &mut *sink,
            };
            scheduler.poll(clock.now_ms(), &mut tick);

            let wait = scheduler
                .next_due_in(clock.now_ms())
                .map_or(MAX_SLEEP_SLICE_MS, |ms| ms.min(MAX_SLEEP_SLICE_MS));
            if wait > 0 && !stop.stop_requested() {
                clock.sleep_ms(wait);
            }
        }

        self.state = MonitorState::Stopped;
        info!("Monitor: stopped after {} readings", self.readings_taken);
        sink.emit(&AppEvent::Stopped {
            readings_taken: self.readings_taken,
        });
        self.state
    }
}

/// Borrows everything one scheduled reading needs, for the duration of a
/// single scheduler poll.
struct ScheduledReading<'a, A, T, D, E> {
    monitor: &'a mut Monitor,
    adc: &'a mut A,
    temp: &'a mut T,
    delay: &'a mut D,
    sink: &'a mut E,
}

impl<A, T, D, E> SchedulerDelegate for ScheduledReading<'_, A, T, D, E>
where
    A: AdcPort,
    T: TemperaturePort,
    D: DelayNs,
    E: EventSink,
{
    fn on_schedule_fired(&mut self, _label: &str, now_ms: u64) {
        let result = self
            .monitor
            .read_once(&mut *self.adc, &mut *self.temp, &mut *self.delay);
        match result {
            Ok(reading) => {
                self.sink.emit(&AppEvent::Reading {
                    timestamp_ms: now_ms,
                    reading,
                });
            }
            Err(error) => {
                warn!("Monitor: reading failed: {}", error);
                self.sink.emit(&AppEvent::ReadingFailed {
                    timestamp_ms: now_ms,
                    error,
                });
                // Faulted is per-iteration only.
                self.monitor.state = MonitorState::Idle;
            }
        }
    }
}
