//! Sensor drivers.
//!
//! Each driver implements one domain port directly, so the calibrator and
//! the monitor can borrow the probe and the temperature sensor
//! independently.

pub mod ec_probe;
pub mod temperature;

pub use ec_probe::EcProbe;
pub use temperature::OnChipTemperature;
