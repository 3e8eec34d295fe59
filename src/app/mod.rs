//! Application core — pure domain logic, zero I/O.
//!
//! The calibration fit, the temperature-compensated measurement model and
//! the monitoring loop live here.  All interaction with hardware, the
//! operator and the filesystem happens through **port traits** defined in
//! [`ports`], keeping this layer fully testable without real peripherals.

pub mod calibrator;
pub mod events;
pub mod monitor;
pub mod ports;
