//! Operator console adapters (USB-serial / UART stdin + stdout).
//!
//! - [`StdinConfirmer`] implements [`Confirmer`] for the calibration prompts.
//! - [`ConsoleSink`] implements [`EventSink`], printing one line per event.
//!   Reading lines are only ever appended, never rewritten.
//! - [`spawn_stop_watcher`] raises the stop flag on Ctrl+C or `q`.
//!
//! The default ESP-IDF console VFS is non-blocking, so the binaries call
//! [`install_console_driver`] before reading stdin.

use std::io::{self, BufRead, ErrorKind, Read, Write};
use std::thread;
use std::time::Duration;

use log::{info, warn};

use crate::app::calibrator::CalibratorState;
use crate::app::events::AppEvent;
use crate::app::monitor::TemperatureSource;
use crate::app::ports::{Confirmer, EventSink};
use crate::stop;

/// How long to wait instead of a keypress when stdin is closed.
pub const NO_STDIN_WAIT: Duration = Duration::from_secs(5);

/// Retry period while stdin has nothing to read yet.
pub const INPUT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// ETX, sent by terminals for Ctrl+C.
const CTRL_C: u8 = 0x03;

// ───────────────────────────────────────────────────────────────
// Confirmer
// ───────────────────────────────────────────────────────────────

/// Blocks on a line from `input`.  An empty line (ENTER) or `y` confirms,
/// `n` or `q` declines.  With no input attached (EOF) it waits
/// [`NO_STDIN_WAIT`] so the operator still has time to position the probe.
///
/// `WouldBlock` and `Interrupted` mean no keypress yet and are retried.
/// Any other read error declines.
pub struct StdinConfirmer<R> {
    input: R,
    no_input_wait: Duration,
    poll_interval: Duration,
}

impl StdinConfirmer<io::StdinLock<'static>> {
    pub fn stdin() -> Self {
        Self::new(io::stdin().lock())
    }
}

impl<R: BufRead> StdinConfirmer<R> {
    pub fn new(input: R) -> Self {
        Self {
            input,
            no_input_wait: NO_STDIN_WAIT,
            poll_interval: INPUT_POLL_INTERVAL,
        }
    }

    pub fn with_no_input_wait(mut self, wait: Duration) -> Self {
        self.no_input_wait = wait;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

impl<R: BufRead> Confirmer for StdinConfirmer<R> {
    fn confirm(&mut self, message: &str) -> bool {
        println!("\n{message}");
        print!("Press ENTER when ready (n to abort)... ");
        let _ = io::stdout().flush();

        // Kept across retries: a partial line survives a WouldBlock.
        let mut line = String::new();
        loop {
            match self.input.read_line(&mut line) {
                Ok(0) if line.is_empty() => {
                    println!(
                        "stdin not available; waiting {} seconds instead of input.",
                        self.no_input_wait.as_secs()
                    );
                    thread::sleep(self.no_input_wait);
                    return true;
                }
                Ok(_) => return !matches!(line.trim(), "n" | "N" | "q" | "Q"),
                Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::Interrupted) => {
                    thread::sleep(self.poll_interval);
                }
                Err(e) => {
                    warn!("Console read failed: {}", e);
                    return false;
                }
            }
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Console sink
// ───────────────────────────────────────────────────────────────

/// Operator-facing output.  Writes to any [`Write`], stdout by default.
pub struct ConsoleSink<W> {
    out: W,
}

impl ConsoleSink<io::Stdout> {
    pub fn stdout() -> Self {
        Self { out: io::stdout() }
    }
}

impl<W: Write> ConsoleSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, args: core::fmt::Arguments<'_>) {
        if writeln!(self.out, "{args}").and_then(|()| self.out.flush()).is_err() {
            warn!("ConsoleSink: write failed");
        }
    }
}

impl<W: Write> EventSink for ConsoleSink<W> {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::CalibratorStateChanged { to, .. } => {
                if let CalibratorState::Sampling(buffer) = to {
                    self.line(format_args!("Sampling {} buffer...", buffer.label()));
                }
            }
            AppEvent::PointCaptured {
                buffer,
                raw_average,
                discarded,
            } => {
                self.line(format_args!(
                    "Raw ADC average ({}): {:.2}{}",
                    buffer.label(),
                    raw_average,
                    if *discarded > 0 { " (some samples discarded)" } else { "" }
                ));
            }
            AppEvent::CalibrationPersisted(cfg) => {
                self.line(format_args!("\nCalibration complete!"));
                self.line(format_args!("Slope:     {:.8} µS/cm per ADC count", cfg.slope));
                self.line(format_args!("Intercept: {:.2} µS/cm", cfg.intercept));
            }
            AppEvent::CalibrationFailed(e) => {
                self.line(format_args!("\nCalibrationError: {e}. No configuration written."));
            }
            AppEvent::Reading {
                timestamp_ms,
                reading,
            } => match reading.temperature_source {
                TemperatureSource::Live => self.line(format_args!(
                    "[{:>10}s] Raw ADC: {:.2}, Conductivity: {:.2} µS/cm @ {:.1} °C",
                    timestamp_ms / 1000,
                    reading.raw_average,
                    reading.ec_compensated,
                    reading.temperature_c
                )),
                TemperatureSource::Fallback => self.line(format_args!(
                    "[{:>10}s] Raw ADC: {:.2}, Conductivity: {:.2} µS/cm \
                     (no temperature compensation, assumed {:.1} °C)",
                    timestamp_ms / 1000,
                    reading.raw_average,
                    reading.ec_compensated,
                    reading.temperature_c
                )),
            },
            AppEvent::ReadingFailed {
                timestamp_ms,
                error,
            } => {
                self.line(format_args!(
                    "[{:>10}s] Reading failed: {error}",
                    timestamp_ms / 1000
                ));
            }
            AppEvent::Stopped { .. } => {
                self.line(format_args!("\nMonitoring stopped by user."));
            }
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Console driver
// ───────────────────────────────────────────────────────────────

/// Route stdin/stdout through the USB-Serial-JTAG driver so reads block
/// until the operator types.
#[cfg(all(target_os = "espidf", esp_idf_esp_console_usb_serial_jtag))]
pub fn install_console_driver() -> io::Result<()> {
    use esp_idf_svc::sys::*;

    let mut cfg = usb_serial_jtag_driver_config_t {
        tx_buffer_size: 256,
        rx_buffer_size: 256,
    };
    // SAFETY: called once from main() before the console is read.
    unsafe {
        let ret = usb_serial_jtag_driver_install(&mut cfg);
        if ret != ESP_OK as i32 && ret != ESP_ERR_INVALID_STATE as i32 {
            return Err(io::Error::other(format!(
                "usb_serial_jtag_driver_install failed (rc={ret})"
            )));
        }
        esp_vfs_usb_serial_jtag_use_driver();
    }
    info!("Console: USB-Serial-JTAG driver installed");
    Ok(())
}

/// Route stdin/stdout through the UART0 driver so reads block until the
/// operator types.
#[cfg(all(target_os = "espidf", not(esp_idf_esp_console_usb_serial_jtag)))]
pub fn install_console_driver() -> io::Result<()> {
    use esp_idf_svc::sys::*;

    const CONSOLE_UART: i32 = 0;
    // SAFETY: called once from main() before the console is read.
    unsafe {
        let ret = uart_driver_install(CONSOLE_UART, 256, 0, 0, core::ptr::null_mut(), 0);
        if ret != ESP_OK as i32 && ret != ESP_ERR_INVALID_STATE as i32 {
            return Err(io::Error::other(format!(
                "uart_driver_install failed (rc={ret})"
            )));
        }
        esp_vfs_dev_uart_use_driver(CONSOLE_UART);
    }
    info!("Console: UART{} driver installed", CONSOLE_UART);
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn install_console_driver() -> io::Result<()> {
    Ok(())
}

// ───────────────────────────────────────────────────────────────
// Stop watcher
// ───────────────────────────────────────────────────────────────

/// Watch stdin on a background thread and raise the stop flag on Ctrl+C
/// or `q`.  The thread only ever touches the atomic flag.
pub fn spawn_stop_watcher() -> io::Result<thread::JoinHandle<()>> {
    thread::Builder::new()
        .name("stop-watch".into())
        .stack_size(8 * 1024)
        .spawn(|| {
            for byte in io::stdin().lock().bytes() {
                match byte {
                    Ok(CTRL_C | b'q' | b'Q') => {
                        info!("Stop requested from console");
                        stop::request_stop();
                        return;
                    }
                    Ok(_) => {}
                    Err(e) if e.kind() == ErrorKind::WouldBlock => {
                        thread::sleep(INPUT_POLL_INTERVAL);
                    }
                    Err(_) => {
                        // Without a console there is nothing to watch.
                        thread::sleep(Duration::from_secs(1));
                    }
                }
            }
        })
}
