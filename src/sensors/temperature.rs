//! ESP32-S3 on-chip temperature sensor.
//!
//! Measures die temperature, not water temperature, so it is only a rough
//! proxy; it is still adequate for conductivity compensation when the
//! board sits next to the sample.  If the sensor cannot be installed the
//! driver keeps working and reports no reading.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: uses the `temperature_sensor` driver (initialised by hw_init).
//! On host/test: reads centi-degrees from a static `AtomicI32`; a
//! static `AtomicBool` simulates a missing sensor.

use core::sync::atomic::{AtomicBool, AtomicI32, Ordering};

use log::warn;

use crate::app::ports::TemperaturePort;
use crate::drivers::hw_init;

static SIM_TEMP_CENTI_C: AtomicI32 = AtomicI32::new(2500);
static SIM_TEMP_PRESENT: AtomicBool = AtomicBool::new(true);

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_temp_c(celsius: f32) {
    SIM_TEMP_CENTI_C.store((celsius * 100.0).round() as i32, Ordering::Relaxed);
}

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_temp_present(present: bool) {
    SIM_TEMP_PRESENT.store(present, Ordering::Relaxed);
}

pub struct OnChipTemperature {
    available: bool,
}

impl OnChipTemperature {
    /// Install the sensor.  Failure is logged, not returned.
    pub fn new() -> Self {
        let available = match hw_init::init_temp_sensor() {
            Ok(()) => true,
            Err(e) => {
                warn!("Temperature sensor unavailable: {}", e);
                false
            }
        };
        Self { available }
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    #[cfg(target_os = "espidf")]
    fn read_sensor(&self) -> Option<f32> {
        hw_init::temp_sensor_read()
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_sensor(&self) -> Option<f32> {
        SIM_TEMP_PRESENT
            .load(Ordering::Relaxed)
            .then(|| SIM_TEMP_CENTI_C.load(Ordering::Relaxed) as f32 / 100.0)
    }
}

impl Default for OnChipTemperature {
    fn default() -> Self {
        Self::new()
    }
}

impl TemperaturePort for OnChipTemperature {
    fn read_celsius(&mut self) -> Option<f32> {
        if !self.available {
            return None;
        }
        self.read_sensor()
    }
}
