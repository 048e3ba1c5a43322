// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), no_std)]

//! Provides a periodic tick counter with two delay flavours.
//!
//! The [Clock] counts interrupts of a fixed-frequency timer compare
//! event. It offers:
//!
//! * coarse delays ([Clock::wait_ticks], [Clock::wait_seconds]) that put
//!   the processor to sleep between ticks through an [Idle] primitive,
//! * fine delays ([Clock::wait_microseconds]) that busy-poll the
//!   free-running timer register itself, for protocol timing below one
//!   tick.
//!
//! Usage:
//! ```ignore
//! use tick_clock::{Clock, DEFAULT_CONFIG, Wfi};
//!
//! static CLOCK: Clock = Clock::new(DEFAULT_CONFIG);
//!
//! #[interrupt]
//! fn TIMER_COMPARE() {
//!     CLOCK.tick_handler();
//! }
//!
//! fn main() -> ! {
//!     // .. configure the timer for DEFAULT_CONFIG.tick_hz compare events
//!     loop {
//!         CLOCK.wait_seconds(10, &mut Wfi);
//!     }
//! }
//! ```
//!
//! The interrupt handler is the only writer of the tick counter, and the
//! counter is a single word read atomically, so no critical section is
//! needed to take a delay snapshot.

#[cfg(feature = "defmt")]
pub(crate) use defmt::trace;
#[cfg(not(feature = "defmt"))]
pub(crate) use log::trace;

mod clock;
mod config;
mod delay;
mod idle;

pub use clock::{deadline_reached, in_window, Clock, FreeRunningCounter};
pub use config::{ClockConfig, DEFAULT_CONFIG};
pub use delay::Delay;
pub use idle::{block_until, Idle, Spin};

#[cfg(feature = "cortex-m")]
pub use idle::Wfi;
