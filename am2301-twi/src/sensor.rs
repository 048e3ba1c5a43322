// SPDX-License-Identifier: Apache-2.0

//! Host side of the AM2301 single-wire handshake.
//!
//! The data line is an open-drain output with a pull-up: driving it high
//! releases it to the sensor. A measurement is requested by holding the line
//! low, after which the sensor answers with a train of falling edges picked
//! up by the [CaptureChannel].
//!
//! ```ignore
//! let mut sensor = Am2301::new(&SENSOR, line, capture);
//! sensor.wake_up(&mut delay)?;
//! CLOCK.wait_seconds(1, &mut Wfi);
//! loop {
//!     sensor.start_measurement(&mut delay)?;
//!     CLOCK.wait_seconds(1, &mut Wfi);
//!     sensor.stop_measurement()?;
//!     if let Some(reading) = sensor.reading().validated() {
//!         // ..
//!     }
//! }
//! ```

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use crate::capture::decode::Reading;
use crate::capture::{CaptureChannel, CaptureControl};

/// How long the start signal holds the line low
pub const START_SIGNAL_LOW_US: u32 = 2_000;

/// Pause between the edges of the power-up dummy request
pub const WAKE_UP_PAUSE_US: u32 = 5_000;

/// AM2301 on a capture-capable line
pub struct Am2301<'a, P, H> {
    channel: &'a CaptureChannel,
    line: P,
    capture: H,
}

impl<'a, P: OutputPin, H: CaptureControl> Am2301<'a, P, H> {
    pub fn new(channel: &'a CaptureChannel, line: P, capture: H) -> Self {
        Self {
            channel,
            line,
            capture,
        }
    }

    /// Dummy measurement request issued once after power-up.
    ///
    /// The sensor answers its first request with garbage, nothing is
    /// captured for this one. Wait a second before the first real
    /// measurement.
    pub fn wake_up<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), P::Error> {
        // Low first, the line must not go from floating straight to high
        self.line.set_low()?;
        self.line.set_high()?;
        delay.delay_us(WAKE_UP_PAUSE_US);
        self.line.set_low()?;
        delay.delay_us(WAKE_UP_PAUSE_US);
        self.line.set_high()
    }

    /// Send the start signal and arm edge capture.
    ///
    /// The sensor needs a couple of milliseconds to clock out its frame,
    /// leave the channel armed for well over that before stopping.
    pub fn start_measurement<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), P::Error> {
        self.line.set_low()?;
        delay.delay_us(START_SIGNAL_LOW_US);
        self.line.set_high()?;
        self.channel.arm(&mut self.capture);
        Ok(())
    }

    /// Stop capturing and return the line to idle-high.
    pub fn stop_measurement(&mut self) -> Result<(), P::Error> {
        self.channel.disarm(&mut self.capture);
        self.line.set_high()
    }

    /// Decode what the last measurement captured.
    pub fn reading(&self) -> Reading {
        self.channel.compute_reading()
    }

    pub fn release(self) -> (P, H) {
        (self.line, self.capture)
    }
}
