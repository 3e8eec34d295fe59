//! EC probe calibration and monitoring library.
//!
//! Exposes the pure-logic modules for integration testing and for the two
//! on-device binaries, `ec-calibrate` and `ec-monitor`.  All
//! ESP-IDF-specific code is guarded by `#[cfg(target_os = "espidf")]`
//! within each module; on the host the drivers read simulation values.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod error;
pub mod pins;
pub mod sampling;
pub mod scheduler;
pub mod stop;

pub mod adapters;
pub mod drivers;
pub mod sensors;
