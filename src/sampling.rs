//! Averaged probe sampling shared by the calibrator and the monitor.
//!
//! Both components reduce a window of raw conversions to one value with
//! the same policy, so calibration and measurement conditions match:
//!
//! - `samples` conversions, `sample_delay_ms` apart (no delay after the last);
//! - failed or out-of-range conversions are discarded and the window carries on;
//! - the result is the plain arithmetic mean of the surviving samples;
//! - only a window in which *every* sample was discarded is an error.

use embedded_hal::delay::DelayNs;
use log::{debug, warn};

use crate::app::ports::AdcPort;
use crate::error::SensorError;

/// Full-scale value of the 12-bit ESP32-S3 ADC.
pub const ADC_MAX: u16 = 4095;

/// Result of one averaging window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Averaged {
    /// Arithmetic mean of the accepted samples.
    pub mean: f32,
    /// Samples that contributed to the mean.
    pub accepted: u16,
    /// Samples dropped because the read failed or was out of range.
    pub discarded: u16,
}

/// Take `samples` raw reads from `adc` and average them.
pub fn average_samples(
    adc: &mut impl AdcPort,
    delay: &mut impl DelayNs,
    samples: u16,
    sample_delay_ms: u32,
) -> Result<Averaged, SensorError> {
    let mut total: u64 = 0;
    let mut accepted: u16 = 0;
    let mut discarded: u16 = 0;

    for i in 0..samples {
        match adc.read_raw() {
            Ok(raw) if raw <= ADC_MAX => {
                total += u64::from(raw);
                accepted += 1;
            }
            Ok(raw) => {
                debug!("GPIO{}: sample {} out of range ({})", adc.pin(), i, raw);
                discarded += 1;
            }
            Err(e) => {
                debug!("GPIO{}: sample {} failed: {}", adc.pin(), i, e);
                discarded += 1;
            }
        }
        if i + 1 < samples {
            delay.delay_ms(sample_delay_ms);
        }
    }

    if accepted == 0 {
        warn!("GPIO{}: all {} samples failed", adc.pin(), samples);
        return Err(SensorError::AllSamplesFailed);
    }
    if discarded > 0 {
        warn!(
            "GPIO{}: discarded {}/{} samples",
            adc.pin(),
            discarded,
            samples
        );
    }

    Ok(Averaged {
        mean: (total as f64 / f64::from(accepted)) as f32,
        accepted,
        discarded,
    })
}
