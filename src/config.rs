//! Calibration record and tunable parameters.
//!
//! [`CalibrationConfig`] is the only artifact shared between the
//! calibrator and the monitor.  It is stored as pretty-printed JSON so an
//! operator can review it or override the sampling parameters by hand.
//!
//! Sampling fields fall back to the monitor defaults when missing from the
//! file.  `slope` and `intercept` never do: a record with only one of them
//! (or neither) is rejected by [`StoredConfig::into_config`].

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::pins;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Well-known location of the calibration file on the SPIFFS partition.
pub const CONFIG_PATH: &str = "/spiffs/ec_config.json";

/// Schema version written by the calibrator.
pub const CONFIG_VERSION: u8 = 1;

/// Low reference buffer (µS/cm).
pub const LOW_POINT_US_CM: f32 = 1413.0;
/// High reference buffer (µS/cm, i.e. 12.88 mS/cm).
pub const HIGH_POINT_US_CM: f32 = 12_880.0;

/// Temperature that compensated readings are normalised to (°C).
pub const REFERENCE_TEMP_C: f32 = 25.0;
/// Linear conductivity temperature coefficient (fraction per °C).
pub const TEMP_COEFFICIENT: f32 = 0.02;

/// ADC full-scale reference voltage (V).
pub const VREF: f32 = 3.3;

/// Interval between monitor readings: one hour.
pub const READING_INTERVAL_MS: u64 = 3_600_000;

/// Calibration averages more samples than the monitor for a steadier fit.
pub const CALIBRATION_SAMPLES: u16 = 200;
pub const CALIBRATION_SAMPLE_DELAY_MS: u32 = 10;

pub const DEFAULT_SAMPLES: u16 = 50;
pub const DEFAULT_SAMPLE_DELAY_MS: u32 = 20;

// ---------------------------------------------------------------------------
// Sampling parameters
// ---------------------------------------------------------------------------

/// Where and how the probe is sampled.
///
/// Passed explicitly to both the calibrator and the monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplingConfig {
    /// ADC1-capable GPIO the probe is wired to.
    pub adc_pin: i32,
    /// Raw reads averaged per logical measurement (>= 1).
    pub samples: u16,
    /// Delay between consecutive raw reads (ms).
    pub sample_delay_ms: u32,
}

impl SamplingConfig {
    /// Parameters used during a calibration run.
    pub const fn calibration() -> Self {
        Self {
            adc_pin: pins::EC_ADC_GPIO,
            samples: CALIBRATION_SAMPLES,
            sample_delay_ms: CALIBRATION_SAMPLE_DELAY_MS,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.samples == 0 {
            return Err(ConfigError::Invalid("samples must be >= 1"));
        }
        if pins::adc1_channel_for_gpio(self.adc_pin).is_none() {
            return Err(ConfigError::Invalid("adc_pin must be an ADC1 GPIO (1–10)"));
        }
        Ok(())
    }
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            adc_pin: pins::EC_ADC_GPIO,
            samples: DEFAULT_SAMPLES,
            sample_delay_ms: DEFAULT_SAMPLE_DELAY_MS,
        }
    }
}

// ---------------------------------------------------------------------------
// Persisted record
// ---------------------------------------------------------------------------

/// A validated calibration.  Slope and intercept are always both present.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalibrationConfig {
    pub version: u8,
    pub adc_pin: i32,
    pub vref: f32,
    pub samples: u16,
    pub sample_delay_ms: u32,
    /// Averaged raw reading in the low buffer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_low: Option<f32>,
    /// Averaged raw reading in the high buffer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_high: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub low_point_us_cm: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub high_point_us_cm: Option<f32>,
    /// µS/cm per ADC count.
    pub slope: f32,
    /// µS/cm.
    pub intercept: f32,
}

impl CalibrationConfig {
    /// Build a record from a fitted line and the sampling parameters used.
    pub fn new(sampling: SamplingConfig, slope: f32, intercept: f32) -> Self {
        Self {
            version: CONFIG_VERSION,
            adc_pin: sampling.adc_pin,
            vref: VREF,
            samples: sampling.samples,
            sample_delay_ms: sampling.sample_delay_ms,
            raw_low: None,
            raw_high: None,
            low_point_us_cm: None,
            high_point_us_cm: None,
            slope,
            intercept,
        }
    }

    pub fn sampling(&self) -> SamplingConfig {
        SamplingConfig {
            adc_pin: self.adc_pin,
            samples: self.samples,
            sample_delay_ms: self.sample_delay_ms,
        }
    }

    /// Map an averaged raw reading to uncompensated EC (µS/cm).
    pub fn apply(&self, raw: f32) -> f32 {
        self.slope * raw + self.intercept
    }

    /// Range-check every field.  Must pass before the record is persisted
    /// or handed to the monitor.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.sampling().validate()?;
        if !self.slope.is_finite() || !self.intercept.is_finite() {
            return Err(ConfigError::Invalid("slope and intercept must be finite"));
        }
        if self.slope == 0.0 {
            return Err(ConfigError::Invalid("slope must be non-zero"));
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|_| ConfigError::Corrupted)
    }

    /// Parse and validate a stored record.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let stored: StoredConfig =
            serde_json::from_str(text).map_err(|_| ConfigError::Corrupted)?;
        stored.into_config()
    }
}

/// On-disk shape: every field optional so that hand-edited files can omit
/// the sampling parameters, and so a lone slope or intercept is reported as
/// an invalid calibration rather than a parse error.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StoredConfig {
    pub version: Option<u8>,
    pub adc_pin: Option<i32>,
    pub vref: Option<f32>,
    pub samples: Option<u16>,
    pub sample_delay_ms: Option<u32>,
    pub raw_low: Option<f32>,
    pub raw_high: Option<f32>,
    pub low_point_us_cm: Option<f32>,
    pub high_point_us_cm: Option<f32>,
    pub slope: Option<f32>,
    pub intercept: Option<f32>,
}

impl StoredConfig {
    pub fn into_config(self) -> Result<CalibrationConfig, ConfigError> {
        let (slope, intercept) = match (self.slope, self.intercept) {
            (Some(s), Some(i)) => (s, i),
            (Some(_), None) => return Err(ConfigError::Invalid("intercept missing")),
            (None, Some(_)) => return Err(ConfigError::Invalid("slope missing")),
            (None, None) => return Err(ConfigError::Invalid("slope and intercept missing")),
        };
        if let Some(v) = self.version {
            if v > CONFIG_VERSION {
                return Err(ConfigError::Invalid("unsupported config version"));
            }
        }

        let defaults = SamplingConfig::default();
        let cfg = CalibrationConfig {
            version: self.version.unwrap_or(CONFIG_VERSION),
            adc_pin: self.adc_pin.unwrap_or(defaults.adc_pin),
            vref: self.vref.unwrap_or(VREF),
            samples: self.samples.unwrap_or(defaults.samples),
            sample_delay_ms: self.sample_delay_ms.unwrap_or(defaults.sample_delay_ms),
            raw_low: self.raw_low,
            raw_high: self.raw_high,
            low_point_us_cm: self.low_point_us_cm,
            high_point_us_cm: self.high_point_us_cm,
            slope,
            intercept,
        };
        cfg.validate()?;
        Ok(cfg)
    }
}
