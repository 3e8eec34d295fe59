//! Continuous EC monitoring, on-device entry point.
//!
//! Loads the calibration written by `ec-calibrate` and prints one
//! temperature-compensated conductivity reading per hour until the
//! operator presses Ctrl+C or `q`.  The calibration file is never written.
#![deny(unused_must_use)]

use anyhow::{Context, Result};
use log::info;

use ecprobe::adapters::console::{ConsoleSink, install_console_driver, spawn_stop_watcher};
use ecprobe::adapters::json_store::{JsonFileStore, mount_spiffs};
use ecprobe::adapters::log_sink::LogEventSink;
use ecprobe::adapters::time::Esp32Clock;
use ecprobe::app::monitor::Monitor;
use ecprobe::config::CONFIG_PATH;
use ecprobe::error::Error;
use ecprobe::sensors::{EcProbe, OnChipTemperature};
use ecprobe::stop::{self, GlobalStop};

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;
    info!("ec-monitor v{}", env!("CARGO_PKG_VERSION"));

    // ── 2. Calibration (fatal if missing) ─────────────────────
    mount_spiffs().context("mounting the data partition")?;
    let store = JsonFileStore::new(CONFIG_PATH);
    let mut monitor = Monitor::from_store(&store)
        .map_err(Error::from)
        .context("Run ec-calibrate on the device before starting ec-monitor")?;

    // ── 3. Peripherals ────────────────────────────────────────
    let mut probe = EcProbe::new(monitor.config().adc_pin)?;
    let mut temp = OnChipTemperature::new();
    let mut clock = Esp32Clock::new();
    let mut delay = Esp32Clock::new();
    let mut sink = (LogEventSink::new(), ConsoleSink::stdout());

    stop::clear_stop();
    install_console_driver().context("installing the console driver")?;
    spawn_stop_watcher().context("starting the console stop watcher")?;

    println!("EC monitor started");
    println!("===================");
    println!("Press Ctrl+C (or q) to stop. A reading will be logged every hour.");

    // ── 4. Monitor until stopped ──────────────────────────────
    monitor.run_forever(
        &mut probe,
        &mut temp,
        &mut delay,
        &mut clock,
        &GlobalStop,
        &mut sink,
    );
    Ok(())
}
