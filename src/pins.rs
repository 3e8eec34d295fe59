//! GPIO / peripheral pin assignments for the EC probe board.
//!
//! Single source of truth for the defaults; the persisted calibration can
//! override the probe pin.  Any co-resident pH tool must be wired to a
//! different ADC-capable GPIO than [`EC_ADC_GPIO`].

// ---------------------------------------------------------------------------
// Sensors — Analog (ADC1)
// ---------------------------------------------------------------------------

/// Gravity analog EC probe signal board output.
/// ADC1 channel 6 (GPIO 7 on ESP32-S3).
pub const EC_ADC_GPIO: i32 = 7;

/// ADC attenuation for the EC probe (12 dB → 0 – 3.1 V range).
pub const EC_ADC_ATTEN: u32 = 3; // adc_atten_t_ADC_ATTEN_DB_12

/// Lowest GPIO routed to ADC1 on ESP32-S3 (channel 0).
pub const ADC1_FIRST_GPIO: i32 = 1;
/// Highest GPIO routed to ADC1 on ESP32-S3 (channel 9).
pub const ADC1_LAST_GPIO: i32 = 10;

/// Map an ADC1-capable GPIO to its oneshot channel number.
///
/// Returns `None` for pins that are not wired to ADC1.
pub const fn adc1_channel_for_gpio(gpio: i32) -> Option<u32> {
    if gpio >= ADC1_FIRST_GPIO && gpio <= ADC1_LAST_GPIO {
        Some((gpio - ADC1_FIRST_GPIO) as u32)
    } else {
        None
    }
}
