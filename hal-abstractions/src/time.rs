//! Time sources
//!
//! Protocol code never reads hardware timers directly. It takes a
//! [`Clock`] for deadlines and a [`DelayNs`] for sleeping, so host tests can
//! substitute a fake clock that advances only when the code sleeps.

pub use embedded_hal_async::delay::DelayNs;

/// Monotonic millisecond clock
pub trait Clock {
    /// Milliseconds since an arbitrary, fixed origin (usually boot)
    fn now_ms(&self) -> u64;
}

impl<T: Clock + ?Sized> Clock for &T {
    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }
}

/// Calendar clock used for event timestamps
pub trait WallClock {
    /// Seconds since the Unix epoch (UTC)
    fn unix_secs(&self) -> u64;
}

impl<T: WallClock + ?Sized> WallClock for &T {
    fn unix_secs(&self) -> u64 {
        (**self).unix_secs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;

    struct Ticks(Cell<u64>);

    impl Clock for Ticks {
        fn now_ms(&self) -> u64 {
            self.0.get()
        }
    }

    fn elapsed_since<C: Clock>(clock: C, start: u64) -> u64 {
        clock.now_ms() - start
    }

    #[test]
    fn test_clock_by_reference() {
        let ticks = Ticks(Cell::new(10));
        ticks.0.set(250);
        assert_eq!(elapsed_since(&ticks, 10), 240);
    }
}
