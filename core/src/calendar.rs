//! Calendar date/time conversions using O(1) algorithms
//!
//! Implements Howard Hinnant's civil_from_days and days_from_civil algorithms.
//! Reference: http://howardhinnant.github.io/date_algorithms.html
//!
//! Boards use these to turn RTC calendar registers into Unix time, and the
//! EPCIS builder uses them to print event timestamps. UTC only, no leap
//! seconds, years 1970-2105 (u16 year).

use core::fmt::Write;

use heapless::String;

const SECONDS_PER_DAY: u64 = 86400;

/// Length of `YYYY-MM-DDTHH:MM:SSZ`
pub const ISO8601_LEN: usize = 20;

/// Broken-down UTC time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CivilTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

/// Check if year is a leap year (Gregorian calendar)
///
/// - Divisible by 4: leap year
/// - EXCEPT divisible by 100: not a leap year
/// - EXCEPT divisible by 400: leap year
pub fn is_leap_year(year: u16) -> bool {
    (year.is_multiple_of(4) && !year.is_multiple_of(100)) || year.is_multiple_of(400)
}

/// Convert a Unix timestamp to broken-down UTC time
pub fn unix_to_civil(unix_secs: u64) -> CivilTime {
    let days_since_epoch = (unix_secs / SECONDS_PER_DAY) as i32;
    let secs_today = unix_secs % SECONDS_PER_DAY;

    let (year, month, day) = civil_from_days(days_since_epoch);

    CivilTime {
        year,
        month,
        day,
        hour: (secs_today / 3600) as u8,
        minute: ((secs_today % 3600) / 60) as u8,
        second: (secs_today % 60) as u8,
    }
}

/// Convert broken-down UTC time to a Unix timestamp
///
/// Dates before 1970 saturate to 0.
pub fn civil_to_unix(time: CivilTime) -> u64 {
    let days_since_epoch = days_from_civil(time.year, time.month, time.day);
    if days_since_epoch < 0 {
        return 0;
    }

    (days_since_epoch as u64) * SECONDS_PER_DAY
        + (time.hour as u64) * 3600
        + (time.minute as u64) * 60
        + (time.second as u64)
}

/// Format a Unix timestamp as `YYYY-MM-DDTHH:MM:SSZ`
pub fn format_iso8601(unix_secs: u64) -> String<ISO8601_LEN> {
    let t = unix_to_civil(unix_secs);
    let mut out = String::new();
    // 20 bytes exactly for every year below 10000
    let _ = write!(
        out,
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}Z",
        t.year, t.month, t.day, t.hour, t.minute, t.second
    );
    out
}

/// Convert days since Unix epoch to civil date (year, month, day)
fn civil_from_days(days_since_epoch: i32) -> (u16, u8, u8) {
    // Shift epoch from 1970-01-01 to 0000-03-01 so the leap day ends the year
    let z = days_since_epoch + 719468;

    let era = if z >= 0 { z } else { z - 146096 } / 146097;
    let doe = (z - era * 146097) as u32; // day of era [0, 146096]
    let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146096) / 365; // year of era [0, 399]
    let y = (yoe as i32) + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100); // day of year [0, 365]
    let mp = (5 * doy + 2) / 153; // [0, 11], 0 = March

    let d = (doy - (153 * mp + 2) / 5 + 1) as u8;
    let m = if mp < 10 { mp + 3 } else { mp - 9 } as u8;
    let year = if m <= 2 { y + 1 } else { y };

    (year as u16, m, d)
}

/// Convert civil date (year, month, day) to days since Unix epoch
fn days_from_civil(year: u16, month: u8, day: u8) -> i32 {
    let y = year as i32;
    let m = month as i32;
    let d = day as i32;

    // March = month 0, February = month 11
    let (y, m) = if m <= 2 { (y - 1, m + 9) } else { (y, m - 3) };

    let era = if y >= 0 { y } else { y - 399 } / 400;
    let yoe = (y - era * 400) as u32;
    let doy = (153 * (m as u32) + 2) / 5 + (d as u32) - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;

    era * 146097 + (doe as i32) - 719468
}
