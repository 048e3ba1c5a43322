// SPDX-License-Identifier: Apache-2.0

use arrayvec::ArrayVec;
use embedded_hal::i2c::{ErrorType, I2c, Operation, SevenBitAddress};
use tick_clock::Idle;

use super::transaction::MAX_PAYLOAD;
use super::{BusMaster, TwiController};
use crate::errors::BusError;

/// Blocking `embedded-hal` I²C view of the bus master.
///
/// Only writes are supported. All write operations of one
/// [I2c::transaction] call are concatenated into a single bus transaction;
/// any read operation fails the whole call with
/// [BusError::ReadUnsupported] before anything is sent.
///
/// `controller` is the main-thread handle used to assert start conditions,
/// the interrupt handler keeps its own handle to the same peripheral.
pub struct BlockingTwi<'a, C, I> {
    bus: &'a BusMaster,
    controller: C,
    idle: I,
}

impl<'a, C: TwiController, I: Idle> BlockingTwi<'a, C, I> {
    pub fn new(bus: &'a BusMaster, controller: C, idle: I) -> Self {
        Self {
            bus,
            controller,
            idle,
        }
    }

    /// Give back the controller handle and idle primitive
    pub fn release(self) -> (C, I) {
        (self.controller, self.idle)
    }
}

impl<C, I> ErrorType for BlockingTwi<'_, C, I> {
    type Error = BusError;
}

impl<C: TwiController, I: Idle> I2c<SevenBitAddress> for BlockingTwi<'_, C, I> {
    fn transaction(
        &mut self,
        address: SevenBitAddress,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        let mut payload = ArrayVec::<u8, MAX_PAYLOAD>::new();
        for operation in operations.iter() {
            match operation {
                Operation::Write(bytes) => payload
                    .try_extend_from_slice(bytes)
                    .map_err(|_| BusError::PayloadTooLarge)?,
                Operation::Read(_) => return Err(BusError::ReadUnsupported),
            }
        }
        self.bus.submit(&mut self.controller, address, &payload)?;
        self.bus.await_completion(&mut self.idle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::twi::status;
    use core::cell::RefCell;
    use embedded_hal::i2c::{Error, ErrorKind, NoAcknowledgeSource};

    #[derive(Default)]
    struct Peripheral {
        status: u8,
        starts: u32,
        sent: ArrayVec<u8, 64>,
        // Address byte the target refuses, if any
        nack_address: Option<u8>,
    }

    struct Handle<'a>(&'a RefCell<Peripheral>);

    impl TwiController for Handle<'_> {
        fn status(&self) -> u8 {
            self.0.borrow().status
        }
        fn start(&mut self) {
            let mut p = self.0.borrow_mut();
            p.starts += 1;
            p.status = status::START;
        }
        fn transmit(&mut self, byte: u8) {
            let mut p = self.0.borrow_mut();
            let first = p.sent.is_empty() || p.status == status::START;
            p.sent.push(byte);
            p.status = match (first, p.nack_address) {
                (true, Some(refused)) if refused == byte => status::SLA_W_NACK,
                (true, _) => status::SLA_W_ACK,
                (false, _) => status::DATA_ACK,
            };
        }
        fn stop(&mut self) {
            self.0.borrow_mut().status = 0xf8;
        }
    }

    /// Every wake-up runs the bus interrupt once
    struct Interrupts<'a> {
        bus: &'a BusMaster,
        peripheral: &'a RefCell<Peripheral>,
    }
    impl Idle for Interrupts<'_> {
        fn wait_for_interrupt(&mut self) {
            self.bus.on_interrupt(&mut Handle(self.peripheral));
        }
    }

    #[test]
    fn test_write() {
        let bus = BusMaster::new();
        let peripheral = RefCell::new(Peripheral::default());
        let mut twi = BlockingTwi::new(
            &bus,
            Handle(&peripheral),
            Interrupts {
                bus: &bus,
                peripheral: &peripheral,
            },
        );
        twi.write(0x3f, &[0x28, 0x0c]).unwrap();
        let p = peripheral.borrow();
        assert_eq!(p.starts, 1);
        assert_eq!(p.sent.as_slice(), &[0x7e, 0x28, 0x0c]);
    }

    #[test]
    fn test_transaction_concatenates_writes() {
        let bus = BusMaster::new();
        let peripheral = RefCell::new(Peripheral::default());
        let mut twi = BlockingTwi::new(
            &bus,
            Handle(&peripheral),
            Interrupts {
                bus: &bus,
                peripheral: &peripheral,
            },
        );
        twi.transaction(
            0x27,
            &mut [Operation::Write(&[1, 2]), Operation::Write(&[3])],
        )
        .unwrap();
        let p = peripheral.borrow();
        assert_eq!(p.starts, 1);
        assert_eq!(p.sent.as_slice(), &[0x4e, 1, 2, 3]);
    }

    #[test]
    fn test_read_unsupported() {
        let bus = BusMaster::new();
        let peripheral = RefCell::new(Peripheral::default());
        let mut twi = BlockingTwi::new(
            &bus,
            Handle(&peripheral),
            Interrupts {
                bus: &bus,
                peripheral: &peripheral,
            },
        );
        let mut buffer = [0u8; 2];
        assert_eq!(twi.read(0x27, &mut buffer), Err(BusError::ReadUnsupported));
        assert_eq!(
            twi.write_read(0x27, &[1], &mut buffer),
            Err(BusError::ReadUnsupported)
        );
        assert_eq!(peripheral.borrow().starts, 0);
    }

    #[test]
    fn test_address_nack() {
        let bus = BusMaster::new();
        let peripheral = RefCell::new(Peripheral {
            nack_address: Some(0x7e),
            ..Default::default()
        });
        let mut twi = BlockingTwi::new(
            &bus,
            Handle(&peripheral),
            Interrupts {
                bus: &bus,
                peripheral: &peripheral,
            },
        );
        let err = twi.write(0x3f, &[1]).unwrap_err();
        assert_eq!(err, BusError::Status(status::SLA_W_NACK));
        assert_eq!(
            err.kind(),
            ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address)
        );
        assert_eq!(peripheral.borrow().sent.as_slice(), &[0x7e]);

        // A fresh transaction after the failure goes through
        peripheral.borrow_mut().nack_address = None;
        twi.write(0x3f, &[1]).unwrap();
    }

    #[test]
    fn test_payload_too_large() {
        let bus = BusMaster::new();
        let peripheral = RefCell::new(Peripheral::default());
        let mut twi = BlockingTwi::new(
            &bus,
            Handle(&peripheral),
            Interrupts {
                bus: &bus,
                peripheral: &peripheral,
            },
        );
        assert_eq!(
            twi.write(0x3f, &[0; MAX_PAYLOAD + 1]),
            Err(BusError::PayloadTooLarge)
        );
        let (_handle, _idle) = twi.release();
    }
}
