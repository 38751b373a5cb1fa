//! On-chip sensors
//!
//! The Feather carries no environmental sensor of its own, so the STM32's
//! internal temperature sensor stands in for the air temperature. Probe
//! temperature and humidity stay unreported until external sensors are
//! wired up.

use core::convert::Infallible;

use embassy_stm32::adc::{Adc, SampleTime, Temperature};
use embassy_stm32::peripherals::ADC1;
use hal_abstractions::{SensorReadings, SensorSource};

/// ADC reference voltage in millivolts
const VREF_MV: f32 = 3300.0;
/// Full-scale 12-bit reading
const ADC_MAX: f32 = 4095.0;
/// Sensor output at 25 °C (datasheet typical)
const V25_MV: f32 = 760.0;
/// Average slope in mV/°C (datasheet typical)
const AVG_SLOPE_MV_PER_C: f32 = 2.5;

/// Die temperature as air temperature
pub struct InternalTemperature {
    adc: Adc<'static, ADC1>,
    channel: Temperature,
}

impl InternalTemperature {
    pub fn new(peri: embassy_stm32::Peri<'static, ADC1>) -> Self {
        let mut adc = Adc::new(peri);
        // The sensor needs at least 10 µs of sampling
        adc.set_sample_time(SampleTime::CYCLES480);
        let channel = adc.enable_temperature();
        Self { adc, channel }
    }
}

/// Convert a raw 12-bit sample to degrees Celsius
fn raw_to_celsius(raw: u16) -> f32 {
    let mv = f32::from(raw) * VREF_MV / ADC_MAX;
    (mv - V25_MV) / AVG_SLOPE_MV_PER_C + 25.0
}

impl SensorSource for InternalTemperature {
    type Error = Infallible;

    fn read(&mut self) -> Result<SensorReadings, Self::Error> {
        let raw = self.adc.blocking_read(&mut self.channel);
        let air = raw_to_celsius(raw);
        defmt::debug!("Internal temperature: raw={} ({} °C)", raw, air);
        Ok(SensorReadings {
            air_temp_c: Some(air),
            probe_temp_c: None,
            humidity_pct: None,
        })
    }
}
