// SPDX-License-Identifier: Apache-2.0

use super::window::{MeasurementWindow, DATA_BITS};

/// Outcome of decoding a measurement window
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validity {
    /// All 40 bits captured and the checksum matches
    Valid,
    /// All 40 bits captured, checksum mismatch
    ParityError,
    /// Fewer than 40 data bits captured, the sensor did not answer in time
    Incomplete,
}

/// Raw sensor frame as decoded from the edge intervals.
///
/// Both values are in tenths of a unit. The temperature is sign-magnitude:
/// bit 15 is the sign, bits 0-14 the magnitude.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reading {
    pub validity: Validity,
    pub humidity_raw: u16,
    pub temperature_raw: u16,
    pub checksum: u8,
}

impl Reading {
    pub const fn incomplete() -> Self {
        Self {
            validity: Validity::Incomplete,
            humidity_raw: 0,
            temperature_raw: 0,
            checksum: 0,
        }
    }

    /// Checksum byte as transmitted by the sensor
    pub fn checksum(&self) -> u8 {
        self.checksum
    }

    pub fn is_valid(&self) -> bool {
        self.validity == Validity::Valid
    }

    /// The reading, if its checksum verified.
    pub fn validated(self) -> Option<Self> {
        self.is_valid().then_some(self)
    }

    /// Temperature in tenths of a degree Celsius
    pub fn temperature_decicelsius(&self) -> i16 {
        let magnitude = (self.temperature_raw & 0x7fff) as i16;
        if self.temperature_raw & 0x8000 != 0 {
            -magnitude
        } else {
            magnitude
        }
    }

    /// Temperature in degrees Celsius
    pub fn centigrade(&self) -> f32 {
        self.temperature_decicelsius() as f32 / 10.0
    }

    /// Relative humidity in tenths of a percent
    pub fn humidity_permille(&self) -> u16 {
        self.humidity_raw
    }

    /// Relative humidity in percent
    pub fn humidity_percent(&self) -> f32 {
        self.humidity_raw as f32 / 10.0
    }
}

/// Decode a measurement window into a reading.
///
/// Pure: the window is only read, decoding the same window twice gives the
/// same reading.
pub fn decode(window: &MeasurementWindow) -> Reading {
    if !window.is_complete() {
        return Reading::incomplete();
    }
    let threshold = window.zero_bit_threshold;
    let intervals = &window.intervals;

    let humidity_raw = assemble(&intervals[0..16], threshold) as u16;
    let temperature_raw = assemble(&intervals[16..32], threshold) as u16;
    let checksum = assemble(&intervals[32..DATA_BITS], threshold) as u8;

    let [humidity_high, humidity_low] = humidity_raw.to_be_bytes();
    let [temperature_high, temperature_low] = temperature_raw.to_be_bytes();
    let sum = humidity_high
        .wrapping_add(humidity_low)
        .wrapping_add(temperature_high)
        .wrapping_add(temperature_low);

    Reading {
        validity: if sum == checksum {
            Validity::Valid
        } else {
            Validity::ParityError
        },
        humidity_raw,
        temperature_raw,
        checksum,
    }
}

// Most significant bit first: the first interval lands in the top bit.
fn assemble(intervals: &[u16], threshold: u16) -> u32 {
    intervals
        .iter()
        .fold(0, |acc, &interval| (acc << 1) | (interval > threshold) as u32)
}
