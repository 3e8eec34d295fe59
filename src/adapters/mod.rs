//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter      | Implements          | Connects to                  |
//! |--------------|---------------------|------------------------------|
//! | `console`    | Confirmer           | Operator stdin               |
//! |              | EventSink           | Operator stdout              |
//! | `json_store` | ConfigPort          | JSON file on SPIFFS / host   |
//! | `log_sink`   | EventSink           | Serial log output            |
//! | `time`       | Clock, DelayNs      | ESP32 system timer / sleep   |
//!
//! The probe and temperature drivers in [`crate::sensors`] implement
//! `AdcPort` and `TemperaturePort` themselves.

pub mod console;
pub mod json_store;
pub mod log_sink;
pub mod time;
