// SPDX-License-Identifier: Apache-2.0

/// Timer configuration shared by the tick interrupt and the fine delay.
///
/// One hardware timer runs in clear-on-compare mode: it counts from 0 to
/// `counter_period - 1` at `counter_hz`, and every wrap raises the tick
/// interrupt. The tick rate is therefore `counter_hz / counter_period`.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClockConfig {
    /// Tick interrupt frequency in Hz
    pub tick_hz: u32,
    /// Counter increment frequency in Hz
    pub counter_hz: u32,
    /// Number of counter values in one period, the counter wraps to 0 here
    pub counter_period: u16,
    /// Width of the acceptance window of a fine delay, in counter values
    pub guard_band: u16,
}

/// 16 MHz core clock divided by 8, compare match at 20000: 100 Hz ticks.
pub const DEFAULT_CONFIG: ClockConfig = ClockConfig::new(100, 2_000_000, 20_000, 50);

impl ClockConfig {
    /// Creates a validated timer configuration.
    ///
    /// # Panics
    ///
    /// * If `tick_hz` or `counter_hz` is 0
    /// * If `counter_hz` is not `tick_hz * counter_period`
    /// * If `counter_hz` is below 1 MHz (a microsecond must be at least one count)
    /// * If `guard_band` is 0 or does not leave room for a delay inside one period
    pub const fn new(tick_hz: u32, counter_hz: u32, counter_period: u16, guard_band: u16) -> Self {
        if tick_hz == 0 || counter_hz == 0 {
            panic!("Clock frequencies cannot be 0");
        }
        if tick_hz as u64 * counter_period as u64 != counter_hz as u64 {
            panic!("Counter period does not match tick and counter frequencies");
        }
        if counter_hz < 1_000_000 || counter_hz % 1_000_000 != 0 {
            panic!("Counter frequency must be a whole number of MHz");
        }
        if guard_band == 0 || guard_band as u32 * 2 >= counter_period as u32 {
            panic!("Guard band must be non-zero and below half the counter period");
        }
        ClockConfig {
            tick_hz,
            counter_hz,
            counter_period,
            guard_band,
        }
    }

    /// Ticks in one second.
    pub const fn ticks_per_second(&self) -> u32 {
        self.tick_hz
    }

    /// Counter values in one microsecond.
    pub const fn counts_per_us(&self) -> u32 {
        self.counter_hz / 1_000_000
    }

    /// Longest fine delay that fits inside one counter period.
    ///
    /// The target window must not overlap the starting counter value,
    /// otherwise the poll loop could exit immediately.
    pub const fn max_fine_delay_us(&self) -> u32 {
        (self.counter_period as u32 - self.guard_band as u32) / self.counts_per_us()
    }
}
