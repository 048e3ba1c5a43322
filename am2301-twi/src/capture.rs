// SPDX-License-Identifier: Apache-2.0

//! Timer input-capture of the sensor's falling edges.
//!
//! The [CaptureChannel] is meant to live in a `static`, shared between the
//! capture interrupt and the main thread:
//!
//! ```ignore
//! static SENSOR: CaptureChannel = CaptureChannel::new(DEFAULT_CONFIG.counter_period);
//!
//! #[interrupt]
//! fn TIMER_CAPTURE() {
//!     SENSOR.on_capture(capture_register());
//! }
//! ```

use core::cell::RefCell;

use critical_section::Mutex;

use crate::{debug, trace, warn};

pub mod decode;
pub mod window;

use decode::Reading;
use window::{MeasurementWindow, ZERO_BIT_THRESHOLD};

/// Control over the capture interrupt of the sensor line
pub trait CaptureControl {
    /// Clear any pending capture flag and enable the capture interrupt
    fn enable_capture(&mut self);
    fn disable_capture(&mut self);
}

impl<T: CaptureControl + ?Sized> CaptureControl for &mut T {
    fn enable_capture(&mut self) {
        (**self).enable_capture()
    }
    fn disable_capture(&mut self) {
        (**self).disable_capture()
    }
}

#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Idle,
    Armed,
}

struct Inner {
    state: ChannelState,
    window: MeasurementWindow,
}

/// Edge capture channel of one sensor line
pub struct CaptureChannel {
    inner: Mutex<RefCell<Inner>>,
}

impl CaptureChannel {
    /// Channel for a capture timer that wraps at `timer_period`
    pub const fn new(timer_period: u16) -> Self {
        Self::with_threshold(timer_period, ZERO_BIT_THRESHOLD)
    }

    pub const fn with_threshold(timer_period: u16, zero_bit_threshold: u16) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(Inner {
                state: ChannelState::Idle,
                window: MeasurementWindow::new(timer_period, zero_bit_threshold),
            })),
        }
    }

    /// Start a new measurement window and enable the capture interrupt.
    ///
    /// Edges of a previous window are discarded.
    pub fn arm<H: CaptureControl + ?Sized>(&self, hardware: &mut H) {
        critical_section::with(|cs| {
            let mut inner = self.inner.borrow_ref_mut(cs);
            inner.window.reset();
            inner.state = ChannelState::Armed;
        });
        hardware.enable_capture();
        debug!("capture armed");
    }

    /// Disable the capture interrupt, freezing the window.
    pub fn disarm<H: CaptureControl + ?Sized>(&self, hardware: &mut H) {
        hardware.disable_capture();
        let edges = critical_section::with(|cs| {
            let mut inner = self.inner.borrow_ref_mut(cs);
            inner.state = ChannelState::Idle;
            inner.window.edge_count()
        });
        debug!("capture disarmed after {} edges", edges);
    }

    /// Capture interrupt handler, `timestamp` is the latched capture register.
    ///
    /// Edges arriving while the channel is idle are ignored.
    pub fn on_capture(&self, timestamp: u16) {
        critical_section::with(|cs| {
            let mut inner = self.inner.borrow_ref_mut(cs);
            if inner.state == ChannelState::Armed {
                inner.window.record_edge(timestamp);
            }
        })
    }

    pub fn state(&self) -> ChannelState {
        critical_section::with(|cs| self.inner.borrow_ref(cs).state)
    }

    /// Consistent copy of the current window
    pub fn snapshot(&self) -> MeasurementWindow {
        critical_section::with(|cs| self.inner.borrow_ref(cs).window)
    }

    /// Decode the captured window.
    ///
    /// Call after [CaptureChannel::disarm]. The window is copied inside a
    /// critical section and decoded outside it, so calling this while armed
    /// returns a consistent but possibly partial reading.
    pub fn compute_reading(&self) -> Reading {
        let (state, window) = critical_section::with(|cs| {
            let inner = self.inner.borrow_ref(cs);
            (inner.state, inner.window)
        });
        if state == ChannelState::Armed {
            warn!("decoding a window that is still armed");
        }
        trace!("decoding {} edges", window.edge_count());
        let reading = decode::decode(&window);
        debug!(
            "reading: {:?} humidity {:#x} temperature {:#x}",
            reading.validity, reading.humidity_raw, reading.temperature_raw
        );
        reading
    }
}

#[cfg(test)]
mod tests {
    use super::decode::Validity;
    use super::*;

    const PERIOD: u16 = 20_000;

    #[derive(Default)]
    struct TestCapture {
        enabled: bool,
        enables: u32,
    }
    impl CaptureControl for TestCapture {
        fn enable_capture(&mut self) {
            self.enabled = true;
            self.enables += 1;
        }
        fn disable_capture(&mut self) {
            self.enabled = false;
        }
    }

    fn send_frame(channel: &CaptureChannel, bytes: [u8; 5]) {
        let mut now = 100u16;
        channel.on_capture(now);
        now += 320;
        channel.on_capture(now);
        for byte in bytes {
            for bit in (0..8).rev() {
                now = (now + if byte >> bit & 1 == 1 { 240 } else { 150 }) % PERIOD;
                channel.on_capture(now);
            }
        }
        channel.on_capture((now + 150) % PERIOD);
    }

    #[test]
    fn test_idle_channel_ignores_edges() {
        let channel = CaptureChannel::new(PERIOD);
        channel.on_capture(10);
        channel.on_capture(20);
        assert_eq!(channel.snapshot().edge_count(), 0);
        assert_eq!(channel.state(), ChannelState::Idle);
    }

    #[test]
    fn test_arm_capture_disarm_decode() {
        let channel = CaptureChannel::new(PERIOD);
        let mut hardware = TestCapture::default();
        channel.arm(&mut hardware);
        assert!(hardware.enabled);
        assert_eq!(channel.state(), ChannelState::Armed);

        send_frame(&channel, [0x01, 0x90, 0x00, 0xfa, 0x8b]);
        channel.disarm(&mut hardware);
        assert!(!hardware.enabled);

        // Late edges after disarm do not touch the window
        channel.on_capture(7);
        assert_eq!(channel.snapshot().edge_count(), 43);

        let reading = channel.compute_reading();
        assert_eq!(reading.validity, Validity::Valid);
        assert_eq!(reading.humidity_raw, 0x0190);
        assert_eq!(reading.temperature_raw, 0x00fa);
        assert_eq!(channel.compute_reading(), reading);
    }

    #[test]
    fn test_rearm_resets_window() {
        let channel = CaptureChannel::new(PERIOD);
        let mut hardware = TestCapture::default();
        channel.arm(&mut hardware);
        send_frame(&channel, [0x01, 0x90, 0x00, 0xfa, 0x8b]);
        channel.disarm(&mut hardware);

        channel.arm(&mut hardware);
        assert_eq!(hardware.enables, 2);
        assert_eq!(channel.snapshot().edge_count(), 0);
        channel.disarm(&mut hardware);
        assert_eq!(channel.compute_reading().validity, Validity::Incomplete);
    }

    #[test]
    fn test_custom_threshold() {
        let channel = CaptureChannel::with_threshold(PERIOD, 300);
        let mut hardware = TestCapture::default();
        channel.arm(&mut hardware);
        // Every interval is now below the threshold: all zero bits
        send_frame(&channel, [0xff, 0xff, 0xff, 0xff, 0xfc]);
        channel.disarm(&mut hardware);
        let reading = channel.compute_reading();
        assert_eq!(reading.humidity_raw, 0);
        assert_eq!(reading.validity, Validity::Valid);
    }
}
