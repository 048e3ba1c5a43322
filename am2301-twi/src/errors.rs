// SPDX-License-Identifier: Apache-2.0

use embedded_hal::i2c::{ErrorKind, NoAcknowledgeSource};

use crate::twi::status;

/// Two-wire bus master errors
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusError {
    /// Unexpected controller status code, latched when the transaction failed
    Status(u8),
    /// A transaction is still outstanding
    Busy,
    /// Payload does not fit the transaction buffer
    PayloadTooLarge,
    /// Target address does not fit in 7 bits
    InvalidAddress,
    /// Bounded wait ran out of ticks before the transaction ended
    Timeout,
    /// The master is write-only
    ReadUnsupported,
}

impl BusError {
    /// Raw status code of a failed transaction, if the hardware reported one.
    pub fn status_code(&self) -> Option<u8> {
        match self {
            Self::Status(code) => Some(*code),
            _ => None,
        }
    }
}

impl From<core::convert::Infallible> for BusError {
    fn from(e: core::convert::Infallible) -> Self {
        match e {}
    }
}

impl embedded_hal::i2c::Error for BusError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Status(status::SLA_W_NACK) => {
                ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address)
            }
            Self::Status(status::DATA_NACK) => ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data),
            Self::Status(status::ARBITRATION_LOST) => ErrorKind::ArbitrationLoss,
            Self::Status(_) => ErrorKind::Bus,
            _ => ErrorKind::Other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal::i2c::Error;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            BusError::Status(0x20).kind(),
            ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address)
        );
        assert_eq!(
            BusError::Status(0x30).kind(),
            ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data)
        );
        assert_eq!(BusError::Status(0x38).kind(), ErrorKind::ArbitrationLoss);
        assert_eq!(BusError::Status(0x00).kind(), ErrorKind::Bus);
        assert_eq!(BusError::Busy.kind(), ErrorKind::Other);
    }

    #[test]
    fn test_status_code() {
        assert_eq!(BusError::Status(0x48).status_code(), Some(0x48));
        assert_eq!(BusError::Timeout.status_code(), None);
    }
}
