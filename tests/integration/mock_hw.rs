//! Mock hardware and storage adapters for integration tests.
//!
//! Every port the calibrator and monitor consume has a scripted or
//! recording stand-in here, so a full calibration or hours of monitoring
//! run on the host without real ADC pins, flash, or wall-clock waits.

use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;

use ecprobe::app::calibrator::CalibratorState;
use ecprobe::app::events::AppEvent;
use ecprobe::app::monitor::EcReading;
use ecprobe::app::ports::{
    AdcPort, Clock, ConfigPort, Confirmer, EventSink, StopSignal, TemperaturePort,
};
use ecprobe::config::CalibrationConfig;
use ecprobe::error::{ConfigError, SensorError};
use embedded_hal::delay::DelayNs;

// ── ScriptedAdc ───────────────────────────────────────────────

/// Replays queued conversions, then repeats `then` forever.
pub struct ScriptedAdc {
    queue: VecDeque<Result<u16, SensorError>>,
    then: Result<u16, SensorError>,
    pub reads: usize,
}

#[allow(dead_code)]
impl ScriptedAdc {
    pub fn constant(raw: u16) -> Self {
        Self {
            queue: VecDeque::new(),
            then: Ok(raw),
            reads: 0,
        }
    }

    pub fn failing() -> Self {
        Self {
            queue: VecDeque::new(),
            then: Err(SensorError::AdcReadFailed),
            reads: 0,
        }
    }

    /// `count` reads of `raw` ahead of whatever is already queued.
    pub fn push_repeated(&mut self, raw: Result<u16, SensorError>, count: usize) -> &mut Self {
        self.queue.extend(std::iter::repeat_n(raw, count));
        self
    }

    pub fn then(&mut self, raw: Result<u16, SensorError>) -> &mut Self {
        self.then = raw;
        self
    }
}

impl AdcPort for ScriptedAdc {
    fn read_raw(&mut self) -> Result<u16, SensorError> {
        self.reads += 1;
        self.queue.pop_front().unwrap_or(self.then)
    }

    fn pin(&self) -> i32 {
        7
    }
}

// ── ScriptedTemperature ───────────────────────────────────────

pub struct ScriptedTemperature(pub Option<f32>);

impl TemperaturePort for ScriptedTemperature {
    fn read_celsius(&mut self) -> Option<f32> {
        self.0
    }
}

// ── ScriptedConfirmer ─────────────────────────────────────────

/// Answers prompts from a queue; confirms once the queue is empty.
#[derive(Default)]
pub struct ScriptedConfirmer {
    answers: VecDeque<bool>,
    pub prompts: Vec<String>,
}

#[allow(dead_code)]
impl ScriptedConfirmer {
    pub fn always_yes() -> Self {
        Self::default()
    }

    pub fn answering(answers: &[bool]) -> Self {
        Self {
            answers: answers.iter().copied().collect(),
            prompts: Vec::new(),
        }
    }
}

impl Confirmer for ScriptedConfirmer {
    fn confirm(&mut self, message: &str) -> bool {
        self.prompts.push(message.to_owned());
        self.answers.pop_front().unwrap_or(true)
    }
}

// ── MemoryStore ───────────────────────────────────────────────

/// In-memory calibration file.  Holds the serialized JSON so that
/// hand-written (partial, corrupt) records go through the real parser.
#[derive(Default)]
pub struct MemoryStore {
    pub json: Option<String>,
    pub saves: usize,
}

#[allow(dead_code)]
impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_json(json: &str) -> Self {
        Self {
            json: Some(json.to_owned()),
            saves: 0,
        }
    }

    pub fn with_config(config: &CalibrationConfig) -> Self {
        Self {
            json: config.to_json().ok(),
            saves: 0,
        }
    }
}

impl ConfigPort for MemoryStore {
    fn load(&self) -> Result<CalibrationConfig, ConfigError> {
        match &self.json {
            Some(text) => CalibrationConfig::from_json(text),
            None => Err(ConfigError::Missing),
        }
    }

    fn save(&mut self, config: &CalibrationConfig) -> Result<(), ConfigError> {
        config.validate()?;
        self.json = Some(config.to_json()?);
        self.saves += 1;
        Ok(())
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn readings(&self) -> Vec<(u64, EcReading)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                AppEvent::Reading {
                    timestamp_ms,
                    reading,
                } => Some((*timestamp_ms, *reading)),
                _ => None,
            })
            .collect()
    }

    pub fn failures(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, AppEvent::ReadingFailed { .. }))
            .count()
    }

    pub fn calibrator_states(&self) -> Vec<CalibratorState> {
        self.events
            .iter()
            .filter_map(|e| match e {
                AppEvent::CalibratorStateChanged { to, .. } => Some(*to),
                _ => None,
            })
            .collect()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Virtual time ──────────────────────────────────────────────

/// Clock that advances only when slept on.
#[derive(Clone, Default)]
pub struct VirtualClock {
    now: Rc<Cell<u64>>,
    pub longest_sleep_ms: u64,
}

#[allow(dead_code)]
impl VirtualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop signal that trips once this clock reaches `at_ms`.
    pub fn stop_at(&self, at_ms: u64) -> StopAt {
        StopAt {
            now: Rc::clone(&self.now),
            at_ms,
        }
    }
}

impl Clock for VirtualClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }

    fn sleep_ms(&mut self, ms: u64) {
        self.longest_sleep_ms = self.longest_sleep_ms.max(ms);
        self.now.set(self.now.get() + ms);
    }
}

pub struct StopAt {
    now: Rc<Cell<u64>>,
    at_ms: u64,
}

impl StopSignal for StopAt {
    fn stop_requested(&self) -> bool {
        self.now.get() >= self.at_ms
    }
}

/// Inter-sample delay that returns immediately.
pub struct NoDelay;

impl DelayNs for NoDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}
