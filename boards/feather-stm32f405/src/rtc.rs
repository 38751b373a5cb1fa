//! RTC-backed wall clock
//!
//! The internal RTC runs from the 32.768 kHz LSE and keeps counting
//! across the sleep phase. It has 1-second resolution, which is all the
//! event timestamps need.

use defmt::error;
use embassy_stm32::rtc::{Rtc, RtcConfig};
use hal_abstractions::WallClock;
use iot_core::calendar::{civil_to_unix, CivilTime};

/// Wall clock reading the internal RTC
pub struct RtcWallClock {
    rtc: Rtc,
}

impl RtcWallClock {
    pub fn new(peri: embassy_stm32::Peri<'static, embassy_stm32::peripherals::RTC>) -> Self {
        let rtc = Rtc::new(peri, RtcConfig::default());
        defmt::info!("Internal RTC initialized with LSE (32.768kHz)");
        Self { rtc }
    }
}

impl WallClock for RtcWallClock {
    /// Returns 0 if the RTC cannot be read
    fn unix_secs(&self) -> u64 {
        match self.rtc.now() {
            Ok(dt) => civil_to_unix(CivilTime {
                year: dt.year(),
                month: dt.month(),
                day: dt.day(),
                hour: dt.hour(),
                minute: dt.minute(),
                second: dt.second(),
            }),
            Err(_) => {
                error!("Failed to read RTC");
                0
            }
        }
    }
}
