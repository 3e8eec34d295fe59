//! One-shot hardware peripheral initialization.
//!
//! Configures the ADC1 oneshot unit for the probe channel and the on-chip
//! temperature sensor using raw ESP-IDF sys calls.  Called once from the
//! binaries before any sampling starts.  On the host every function is a
//! simulation stub so the rest of the crate compiles and tests unchanged.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

use log::info;

use crate::pins;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    /// The configured GPIO is not routed to ADC1.
    NotAnAdcPin(i32),
    AdcInitFailed(i32),
    TempSensorInitFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotAnAdcPin(gpio) => write!(f, "GPIO{} is not an ADC1 pin", gpio),
            Self::AdcInitFailed(rc) => write!(f, "ADC1 init failed (rc={})", rc),
            Self::TempSensorInitFailed(rc) => {
                write!(f, "temperature sensor init failed (rc={})", rc)
            }
        }
    }
}

impl std::error::Error for HwInitError {}

// ── ADC (oneshot) ─────────────────────────────────────────────

#[cfg(target_os = "espidf")]
static mut ADC1_HANDLE: adc_oneshot_unit_handle_t = core::ptr::null_mut();

/// SAFETY: Must be called only from the single-threaded init path or the
/// sampling path.  No concurrent access is possible because both tools
/// run a single thread of control over the ADC.
#[cfg(target_os = "espidf")]
unsafe fn adc1_handle() -> adc_oneshot_unit_handle_t {
    unsafe { ADC1_HANDLE }
}

/// Configure ADC1 for the probe on `gpio` and return its channel number.
#[cfg(target_os = "espidf")]
pub fn init_adc(gpio: i32) -> Result<u32, HwInitError> {
    let channel = pins::adc1_channel_for_gpio(gpio).ok_or(HwInitError::NotAnAdcPin(gpio))?;

    // SAFETY: called once from main() before sampling; single-threaded.
    unsafe {
        if adc1_handle().is_null() {
            let init_cfg = adc_oneshot_unit_init_cfg_t {
                unit_id: adc_unit_t_ADC_UNIT_1,
                ulp_mode: adc_ulp_mode_t_ADC_ULP_MODE_DISABLE,
                ..Default::default()
            };
            let ret = adc_oneshot_new_unit(&init_cfg, &raw mut ADC1_HANDLE);
            if ret != ESP_OK as i32 {
                return Err(HwInitError::AdcInitFailed(ret));
            }
        }

        let chan_cfg = adc_oneshot_chan_cfg_t {
            atten: pins::EC_ADC_ATTEN,
            bitwidth: adc_bitwidth_t_ADC_BITWIDTH_12,
        };
        let ret = adc_oneshot_config_channel(adc1_handle(), channel, &chan_cfg);
        if ret != ESP_OK as i32 {
            return Err(HwInitError::AdcInitFailed(ret));
        }
    }

    info!("hw_init: ADC1 CH{} configured for GPIO{}", channel, gpio);
    Ok(channel)
}

#[cfg(not(target_os = "espidf"))]
pub fn init_adc(gpio: i32) -> Result<u32, HwInitError> {
    let channel = pins::adc1_channel_for_gpio(gpio).ok_or(HwInitError::NotAnAdcPin(gpio))?;
    info!("hw_init(sim): ADC1 CH{} for GPIO{}", channel, gpio);
    Ok(channel)
}

/// One raw conversion.  `Err` carries the ESP-IDF return code.
#[cfg(target_os = "espidf")]
pub fn adc1_read(channel: u32) -> Result<u16, i32> {
    let mut raw: i32 = 0;
    // SAFETY: see adc1_handle(); single-threaded sampling path only.
    let ret = unsafe { adc_oneshot_read(adc1_handle(), channel, &mut raw) };
    if ret != ESP_OK as i32 {
        return Err(ret);
    }
    Ok(raw.max(0) as u16)
}

// ── On-chip temperature sensor ────────────────────────────────

#[cfg(target_os = "espidf")]
static mut TEMP_HANDLE: temperature_sensor_handle_t = core::ptr::null_mut();

/// Install and enable the on-chip temperature sensor.
#[cfg(target_os = "espidf")]
pub fn init_temp_sensor() -> Result<(), HwInitError> {
    let cfg = temperature_sensor_config_t {
        range_min: -10,
        range_max: 80,
        clk_src: soc_periph_temperature_sensor_clk_src_t_TEMPERATURE_SENSOR_CLK_SRC_DEFAULT,
        ..Default::default()
    };

    // SAFETY: called once from main() before sampling; single-threaded.
    unsafe {
        let ret = temperature_sensor_install(&cfg, &raw mut TEMP_HANDLE);
        if ret != ESP_OK as i32 {
            return Err(HwInitError::TempSensorInitFailed(ret));
        }
        let ret = temperature_sensor_enable(TEMP_HANDLE);
        if ret != ESP_OK as i32 {
            return Err(HwInitError::TempSensorInitFailed(ret));
        }
    }

    info!("hw_init: on-chip temperature sensor enabled");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_temp_sensor() -> Result<(), HwInitError> {
    info!("hw_init(sim): temperature sensor init skipped");
    Ok(())
}

/// Current die temperature, or `None` if the sensor is not installed or
/// the read failed.
#[cfg(target_os = "espidf")]
pub fn temp_sensor_read() -> Option<f32> {
    let mut celsius: f32 = 0.0;
    // SAFETY: TEMP_HANDLE is written once in init_temp_sensor();
    // single-threaded sampling path only.
    unsafe {
        if TEMP_HANDLE.is_null() {
            return None;
        }
        if temperature_sensor_get_celsius(TEMP_HANDLE, &mut celsius) != ESP_OK as i32 {
            return None;
        }
    }
    Some(celsius)
}
