// SPDX-License-Identifier: Apache-2.0

use embedded_hal::delay::DelayNs;

use crate::clock::{Clock, FreeRunningCounter};

/// `embedded-hal` delay provider backed by the fine delay.
///
/// Busy-waits on the timer register with microsecond resolution; nanosecond
/// requests are rounded up to the next microsecond.
pub struct Delay<'a, C: ?Sized> {
    clock: &'a Clock,
    counter: &'a C,
}

impl<'a, C: FreeRunningCounter + ?Sized> Delay<'a, C> {
    pub fn new(clock: &'a Clock, counter: &'a C) -> Self {
        Self { clock, counter }
    }
}

impl<C: FreeRunningCounter + ?Sized> DelayNs for Delay<'_, C> {
    fn delay_ns(&mut self, ns: u32) {
        self.clock.wait_microseconds(ns.div_ceil(1000), self.counter);
    }

    fn delay_us(&mut self, us: u32) {
        self.clock.wait_microseconds(us, self.counter);
    }

    fn delay_ms(&mut self, ms: u32) {
        for _ in 0..ms {
            self.clock.wait_microseconds(1000, self.counter);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_CONFIG;
    use core::cell::Cell;

    struct StepCounter {
        value: Cell<u16>,
        reads: Cell<u32>,
    }
    impl FreeRunningCounter for StepCounter {
        fn count(&self) -> u16 {
            let current = self.value.get();
            self.value.set((current + 1) % DEFAULT_CONFIG.counter_period);
            self.reads.set(self.reads.get() + 1);
            current
        }
    }

    #[test]
    fn test_delay_ns_rounds_up() {
        let clock = Clock::new(DEFAULT_CONFIG);
        let counter = StepCounter {
            value: Cell::new(0),
            reads: Cell::new(0),
        };
        let mut delay = Delay::new(&clock, &counter);
        delay.delay_ns(1);
        // 1 us = 2 counts: start read plus two polls
        assert_eq!(counter.reads.get(), 3);
    }

    #[test]
    fn test_delay_ms() {
        let clock = Clock::new(DEFAULT_CONFIG);
        let counter = StepCounter {
            value: Cell::new(0),
            reads: Cell::new(0),
        };
        let mut delay = Delay::new(&clock, &counter);
        delay.delay_ms(2);
        assert_eq!(counter.reads.get(), 2 * 2001);
    }
}
