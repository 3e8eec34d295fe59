//! Gravity analog EC probe (DFRobot signal board).
//!
//! The signal board outputs a voltage proportional to conductivity, read
//! through one ADC1 channel.  Conversion to µS/cm is not done here: the
//! probe only yields raw counts, and the calibration maps them.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: reads the configured ADC1 channel via the oneshot API
//! (initialised by hw_init).
//! On host/test: reads from a static `AtomicU16` for injection.

use core::sync::atomic::{AtomicBool, AtomicU16, Ordering};

use crate::app::ports::AdcPort;
use crate::drivers::hw_init::{self, HwInitError};
use crate::error::SensorError;

static SIM_EC_ADC: AtomicU16 = AtomicU16::new(2048);
static SIM_EC_FAULT: AtomicBool = AtomicBool::new(false);

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_ec_adc(raw: u16) {
    SIM_EC_ADC.store(raw, Ordering::Relaxed);
}

/// Make every simulated conversion fail (probe disconnected).
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_ec_fault(fault: bool) {
    SIM_EC_FAULT.store(fault, Ordering::Relaxed);
}

pub struct EcProbe {
    gpio: i32,
    #[cfg_attr(not(target_os = "espidf"), allow(dead_code))]
    channel: u32,
}

impl EcProbe {
    /// Bind the probe to `gpio`, configuring its ADC1 channel.
    pub fn new(gpio: i32) -> Result<Self, HwInitError> {
        let channel = hw_init::init_adc(gpio)?;
        Ok(Self { gpio, channel })
    }

    #[cfg(target_os = "espidf")]
    fn read_adc(&self) -> Result<u16, SensorError> {
        hw_init::adc1_read(self.channel).map_err(|rc| {
            log::debug!("GPIO{}: adc_oneshot_read rc={}", self.gpio, rc);
            SensorError::AdcReadFailed
        })
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_adc(&self) -> Result<u16, SensorError> {
        if SIM_EC_FAULT.load(Ordering::Relaxed) {
            return Err(SensorError::AdcReadFailed);
        }
        Ok(SIM_EC_ADC.load(Ordering::Relaxed))
    }
}

impl AdcPort for EcProbe {
    fn read_raw(&mut self) -> Result<u16, SensorError> {
        self.read_adc()
    }

    fn pin(&self) -> i32 {
        self.gpio
    }
}
