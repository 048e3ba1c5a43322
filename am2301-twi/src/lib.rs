// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), no_std)]

//! AM2301 (DHT21) sensor decoder and write-only two-wire bus master
//!
//! Two interrupt-driven peripherals sharing one [tick_clock::Clock]:
//!
//! * [CaptureChannel] timestamps the sensor's falling edges with a timer
//!   input capture and turns the edge intervals into a [Reading]. [Am2301]
//!   adds the host side of the handshake on top.
//! * [BusMaster] runs write transactions (start, address, data, stop) from
//!   the bus controller interrupt, callers submit and sleep until the
//!   transaction ends. [BlockingTwi] wraps it as an `embedded-hal` I²C bus.
//!
//! Both hold their state in a `critical_section::Mutex` so they can live in
//! `static`s shared between interrupt handlers and the main thread. The
//! hardware itself is reached only through the small [CaptureControl] and
//! [TwiController] traits.
//!
//! ```ignore
//! static CLOCK: Clock = Clock::new(DEFAULT_CONFIG);
//! static SENSOR: CaptureChannel = CaptureChannel::new(DEFAULT_CONFIG.counter_period);
//! static BUS: BusMaster = BusMaster::new();
//!
//! let mut sensor = Am2301::new(&SENSOR, line, capture);
//! sensor.start_measurement(&mut Delay::new(&CLOCK, &counter))?;
//! CLOCK.wait_seconds(1, &mut Wfi);
//! sensor.stop_measurement()?;
//! let reading = sensor.reading();
//!
//! BUS.submit(&mut twi, 0x27, &[0x08])?;
//! BUS.await_completion(&mut Wfi)?;
//! ```

#[cfg(feature = "defmt")]
pub(crate) use defmt::{debug, error, trace, warn};
#[cfg(not(feature = "defmt"))]
pub(crate) use log::{debug, error, trace, warn};

pub mod capture;
mod errors;
pub mod sensor;
pub mod twi;

pub use tick_clock;

pub use capture::decode::{Reading, Validity};
pub use capture::window::MeasurementWindow;
pub use capture::{CaptureChannel, CaptureControl, ChannelState};
pub use errors::BusError;
pub use sensor::Am2301;
pub use twi::blocking::BlockingTwi;
pub use twi::transaction::TwiState;
pub use twi::{BusMaster, TwiController};
