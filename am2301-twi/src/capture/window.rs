// SPDX-License-Identifier: Apache-2.0

/// Number of data bits in one AM2301 frame: 16 humidity, 16 temperature, 8 checksum
pub const DATA_BITS: usize = 40;

/// Leading falling edges of the sensor response that carry no data
pub const HANDSHAKE_EDGES: u16 = 2;

/// Last edge that closes a data bit, later edges are discarded
pub const LAST_DATA_EDGE: u16 = HANDSHAKE_EDGES + DATA_BITS as u16;

/// Edges a window must have seen before it is decoded.
///
/// One past the last data edge: the sensor keeps clocking out edges after
/// the checksum, a window that stopped at exactly 42 was cut short.
pub const MIN_DECODE_EDGES: u16 = LAST_DATA_EDGE + 1;

/// Interval length, in timer counts, separating a 0 bit from a 1 bit.
///
/// A 0 bit spans about 76 us edge to edge, a 1 bit about 120 us. At 2 MHz
/// the limit sits at 90 us.
pub const ZERO_BIT_THRESHOLD: u16 = 180;

/// Edge timing accumulated over one measurement.
///
/// Written by the capture interrupt through [MeasurementWindow::record_edge],
/// read by the decoder once capture is disabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeasurementWindow {
    pub(crate) edge_count: u16,
    pub(crate) last_edge_time: u16,
    pub(crate) intervals: [u16; DATA_BITS],
    pub(crate) zero_bit_threshold: u16,
    pub(crate) timer_period: u16,
}

impl MeasurementWindow {
    pub const fn new(timer_period: u16, zero_bit_threshold: u16) -> Self {
        Self {
            edge_count: 0,
            last_edge_time: 0,
            intervals: [0; DATA_BITS],
            zero_bit_threshold,
            timer_period,
        }
    }

    /// Zero the window for a new measurement, keeping its configuration.
    pub fn reset(&mut self) {
        *self = Self::new(self.timer_period, self.zero_bit_threshold);
    }

    /// Falling edge seen at capture register value `timestamp`.
    ///
    /// Edges 1 and 2 are the sensor's response handshake and only set the
    /// reference time. Edges 3 to 42 each close one data bit. Anything after
    /// that is trailing noise.
    pub fn record_edge(&mut self, timestamp: u16) {
        self.edge_count = self.edge_count.saturating_add(1);
        if self.edge_count <= HANDSHAKE_EDGES {
            self.last_edge_time = timestamp;
            return;
        }
        if self.edge_count > LAST_DATA_EDGE {
            return;
        }
        let index = (self.edge_count - HANDSHAKE_EDGES - 1) as usize;
        self.intervals[index] = edge_interval(self.last_edge_time, timestamp, self.timer_period);
        self.last_edge_time = timestamp;
    }

    /// Edges seen since the window was reset.
    pub fn edge_count(&self) -> u16 {
        self.edge_count
    }

    /// Whether the window holds enough edges to be decoded.
    pub fn is_complete(&self) -> bool {
        self.edge_count >= MIN_DECODE_EDGES
    }

    pub fn intervals(&self) -> &[u16; DATA_BITS] {
        &self.intervals
    }

    pub fn zero_bit_threshold(&self) -> u16 {
        self.zero_bit_threshold
    }

    pub fn timer_period(&self) -> u16 {
        self.timer_period
    }
}

/// Counts between two capture values on a timer that wraps at `period`.
///
/// Equal timestamps are taken as one full period apart, the capture
/// hardware cannot latch two edges on the same count.
pub fn edge_interval(last: u16, current: u16, period: u16) -> u16 {
    if current > last {
        current - last
    } else {
        period.wrapping_sub(last - current)
    }
}
