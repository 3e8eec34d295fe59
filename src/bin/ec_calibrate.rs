//! EC probe two-point calibration, on-device entry point.
//!
//! Walks the operator through the 1413 µS/cm and 12.88 mS/cm buffers over
//! the serial console, then writes slope/intercept to the calibration file
//! read by `ec-monitor`.
#![deny(unused_must_use)]

use anyhow::{Context, Result};
use log::info;

use ecprobe::adapters::console::{ConsoleSink, StdinConfirmer, install_console_driver};
use ecprobe::adapters::json_store::{JsonFileStore, mount_spiffs};
use ecprobe::adapters::log_sink::LogEventSink;
use ecprobe::adapters::time::Esp32Clock;
use ecprobe::app::calibrator::Calibrator;
use ecprobe::app::ports::ConfigPort;
use ecprobe::config::{CONFIG_PATH, SamplingConfig};
use ecprobe::error::Error;
use ecprobe::sensors::EcProbe;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;
    info!("ec-calibrate v{}", env!("CARGO_PKG_VERSION"));

    println!("Gravity EC sensor calibration");
    println!("================================");
    println!("This routine records ADC readings in two buffer solutions:");
    println!("  • 1413 µS/cm standard");
    println!("  • 12.88 mS/cm standard");
    println!();
    println!("Make sure the probe is rinsed and gently dried between buffers.");
    println!("Temperature compensation is not applied during calibration; conduct the test");
    println!("close to 25 °C for best accuracy.");

    // ── 2. Storage ────────────────────────────────────────────
    mount_spiffs().context("mounting the data partition")?;
    let mut store = JsonFileStore::new(CONFIG_PATH);

    // A hand-edited probe pin survives recalibration.
    let mut sampling = SamplingConfig::calibration();
    if let Ok(previous) = store.load() {
        sampling.adc_pin = previous.adc_pin;
    }

    // ── 3. Peripherals ────────────────────────────────────────
    let mut probe = EcProbe::new(sampling.adc_pin)?;
    let mut delay = Esp32Clock::new();
    install_console_driver().context("installing the console driver")?;
    let mut confirmer = StdinConfirmer::stdin();
    let mut sink = (LogEventSink::new(), ConsoleSink::stdout());

    // ── 4. Calibrate ──────────────────────────────────────────
    let mut calibrator = Calibrator::new(sampling);
    calibrator
        .run_calibration(&mut probe, &mut delay, &mut confirmer, &mut store, &mut sink)
        .map_err(Error::from)?;

    println!("Configuration saved to '{}'.", store.path().display());
    println!("Use these parameters with ec-monitor to convert ADC readings into conductivity.");
    Ok(())
}
