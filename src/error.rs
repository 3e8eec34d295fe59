//! Unified error types for the EC probe tools.
//!
//! One `Copy` enum per subsystem, each convertible into the top-level
//! [`Error`] so the binaries can report any failure uniformly.  Monitoring
//! errors never escape a single iteration; calibration errors always end
//! the run without touching the configuration store.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible operation in the crate funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The two-point calibration run failed.
    Calibration(CalibrationError),
    /// The stored calibration could not be loaded or saved.
    Config(ConfigError),
    /// The probe could not be read.
    Sensor(SensorError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Calibration(e) => write!(f, "CalibrationError: {e}"),
            Self::Config(e) => write!(f, "ConfigError: {e}"),
            Self::Sensor(e) => write!(f, "SensorReadError: {e}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// ADC read returned an error or timed out.
    AdcReadFailed,
    /// Reading is outside the converter's range.
    OutOfRange,
    /// Every sample in an averaging window was discarded.
    AllSamplesFailed,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AdcReadFailed => write!(f, "ADC read failed"),
            Self::OutOfRange => write!(f, "reading out of range"),
            Self::AllSamplesFailed => write!(f, "every sample in the averaging window failed"),
        }
    }
}

impl std::error::Error for SensorError {}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors from the calibration store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// No calibration file exists at the configured location.
    Missing,
    /// The file parsed but a field failed validation.
    /// The `&'static str` names the field and the rule.
    Invalid(&'static str),
    /// The file is not a valid calibration record.
    Corrupted,
    /// Reading or writing the backing file failed.
    Io,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => write!(f, "missing or invalid calibration (no calibration file)"),
            Self::Invalid(msg) => write!(f, "missing or invalid calibration ({msg})"),
            Self::Corrupted => write!(f, "missing or invalid calibration (unparseable file)"),
            Self::Io => write!(f, "missing or invalid calibration (store unreadable)"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Calibration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationError {
    /// Both reference buffers produced the same raw reading.
    DegenerateReadings,
    /// The operator declined a confirmation prompt.
    Cancelled,
    /// The sampling parameters were rejected before any prompt.
    InvalidSampling(ConfigError),
    /// A reference point could not be sampled.
    Sensor(SensorError),
    /// The fitted calibration could not be persisted.
    Store(ConfigError),
}

impl fmt::Display for CalibrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DegenerateReadings => write!(f, "degenerate readings"),
            Self::Cancelled => write!(f, "cancelled by operator"),
            Self::InvalidSampling(e) => write!(f, "invalid sampling parameters: {e}"),
            Self::Sensor(e) => write!(f, "sampling failed: {e}"),
            Self::Store(e) => write!(f, "could not persist calibration: {e}"),
        }
    }
}

impl std::error::Error for CalibrationError {}

impl From<SensorError> for CalibrationError {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

impl From<ConfigError> for CalibrationError {
    fn from(e: ConfigError) -> Self {
        Self::Store(e)
    }
}

impl From<CalibrationError> for Error {
    fn from(e: CalibrationError) -> Self {
        Self::Calibration(e)
    }
}
