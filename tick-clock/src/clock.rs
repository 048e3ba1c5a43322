// SPDX-License-Identifier: Apache-2.0

use core::sync::atomic::{AtomicU32, Ordering};

use crate::config::ClockConfig;
use crate::idle::{block_until, Idle};
use crate::trace;

/// Read access to the free-running timer register.
///
/// Values are in `0..counter_period`; the register wraps to 0 at the
/// compare match that raises the tick interrupt.
pub trait FreeRunningCounter {
    fn count(&self) -> u16;
}

impl<T: FreeRunningCounter + ?Sized> FreeRunningCounter for &T {
    fn count(&self) -> u16 {
        (**self).count()
    }
}

/// System tick counter.
///
/// Incremented once per timer compare interrupt, wraps at `u32::MAX`.
/// Delay arithmetic uses wrapping differences, so a wrap in the middle of a
/// wait is harmless.
pub struct Clock {
    ticks: AtomicU32,
    config: ClockConfig,
}

impl Clock {
    /// Creates a stopped clock, suitable for a `static`.
    pub const fn new(config: ClockConfig) -> Self {
        Clock {
            ticks: AtomicU32::new(0),
            config,
        }
    }

    /// Tick handler.
    ///
    /// Call this from the timer compare interrupt handler.
    pub fn tick_handler(&self) {
        // Single writer, plain load/store keeps this usable on cores
        // without atomic read-modify-write.
        let ticks = self.ticks.load(Ordering::Relaxed);
        self.ticks.store(ticks.wrapping_add(1), Ordering::SeqCst);
    }

    /// Interrupt handler for nested interrupts.
    ///
    /// Call this instead of tick_handler from the interrupt handler, if
    /// you have nested interrupts enabled.
    #[cfg(feature = "cortex-m")]
    pub fn tick_interrupt_for_nested(&self) {
        cortex_m::interrupt::free(|_| {
            self.tick_handler();
        })
    }

    /// Returns the current tick count.
    pub fn now(&self) -> u32 {
        self.ticks.load(Ordering::SeqCst)
    }

    /// Ticks elapsed since `start`, across counter wrap.
    pub fn elapsed_since(&self, start: u32) -> u32 {
        self.now().wrapping_sub(start)
    }

    pub fn config(&self) -> &ClockConfig {
        &self.config
    }

    /// Sleeps until `ticks` ticks have passed since the call.
    ///
    /// Every wake-up re-checks the tick count, so wake-ups caused by other
    /// interrupts only cost one comparison. `ticks == 0` returns at once.
    pub fn wait_ticks<I: Idle + ?Sized>(&self, ticks: u32, idle: &mut I) {
        if ticks == 0 {
            return;
        }
        let start = self.now();
        block_until(idle, || deadline_reached(self.now(), start, ticks));
    }

    /// Sleeps for `seconds` whole seconds, in tick granularity.
    pub fn wait_seconds<I: Idle + ?Sized>(&self, seconds: u32, idle: &mut I) {
        let ticks = seconds.saturating_mul(self.config.ticks_per_second());
        trace!("wait_seconds: {} s, {} ticks", seconds, ticks);
        self.wait_ticks(ticks, idle);
    }

    /// Busy-waits `us` microseconds by polling the timer register.
    ///
    /// Does not sleep. Delays longer than one counter period are split into
    /// chunks that each fit inside a single period.
    pub fn wait_microseconds<C: FreeRunningCounter + ?Sized>(&self, us: u32, counter: &C) {
        let max_chunk = self.config.max_fine_delay_us();
        let mut remaining = us;
        while remaining > 0 {
            let chunk = remaining.min(max_chunk);
            self.wait_counts(chunk * self.config.counts_per_us(), counter);
            remaining -= chunk;
        }
    }

    fn wait_counts<C: FreeRunningCounter + ?Sized>(&self, counts: u32, counter: &C) {
        let period = self.config.counter_period;
        let start = counter.count() as u32;
        let target = ((start + counts) % period as u32) as u16;
        while !in_window(counter.count(), target, self.config.guard_band, period) {
            core::hint::spin_loop();
        }
    }
}

/// True once `duration` ticks separate `now` from `start`.
pub fn deadline_reached(now: u32, start: u32, duration: u32) -> bool {
    now.wrapping_sub(start) >= duration
}

/// True when `count` lies in `[target, target + guard)` on a counter that
/// wraps at `period`.
///
/// The window may straddle the wrap point.
pub fn in_window(count: u16, target: u16, guard: u16, period: u16) -> bool {
    let period = period as u32;
    let offset = (count as u32 + period - target as u32) % period;
    offset < guard as u32
}
