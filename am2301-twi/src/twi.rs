// SPDX-License-Identifier: Apache-2.0

//! Interrupt-driven, write-only two-wire bus master.
//!
//! [BusMaster::submit] loads a transaction and asserts the start condition,
//! from then on the controller interrupt drives it to completion through
//! [BusMaster::on_interrupt]. The caller sleeps in
//! [BusMaster::await_completion] until the transaction has stopped or
//! failed.
//!
//! ```ignore
//! static BUS: BusMaster = BusMaster::new();
//!
//! #[interrupt]
//! fn TWI() {
//!     BUS.on_interrupt(&mut Controller::steal());
//! }
//!
//! BUS.submit(&mut controller, 0x3f, &[0x08])?;
//! BUS.await_completion(&mut Wfi)?;
//! ```

use core::cell::RefCell;

use critical_section::Mutex;
use tick_clock::{block_until, deadline_reached, Clock, Idle};

use crate::errors::BusError;
use crate::{debug, error, warn};

pub mod blocking;
pub mod transaction;

use transaction::{Command, Transaction, TwiState};

/// Master transmitter status codes, after masking with [status::MASK]
pub mod status {
    /// Prescaler bits share the status register
    pub const MASK: u8 = 0xf8;
    pub const START: u8 = 0x08;
    pub const REPEATED_START: u8 = 0x10;
    pub const SLA_W_ACK: u8 = 0x18;
    pub const SLA_W_NACK: u8 = 0x20;
    pub const DATA_ACK: u8 = 0x28;
    pub const DATA_NACK: u8 = 0x30;
    pub const ARBITRATION_LOST: u8 = 0x38;
}

/// Register-level access to the bus controller
pub trait TwiController {
    /// Raw status register, may include non-status bits
    fn status(&self) -> u8;
    /// Request a start condition with the completion interrupt enabled
    fn start(&mut self);
    /// Load the data register and clear the interrupt flag
    fn transmit(&mut self, byte: u8);
    /// Request a stop condition and clear the interrupt flag
    fn stop(&mut self);
}

impl<T: TwiController + ?Sized> TwiController for &mut T {
    fn status(&self) -> u8 {
        (**self).status()
    }
    fn start(&mut self) {
        (**self).start()
    }
    fn transmit(&mut self, byte: u8) {
        (**self).transmit(byte)
    }
    fn stop(&mut self) {
        (**self).stop()
    }
}

/// The single transaction slot of the bus controller
pub struct BusMaster {
    transaction: Mutex<RefCell<Transaction>>,
}

impl Default for BusMaster {
    fn default() -> Self {
        Self::new()
    }
}

impl BusMaster {
    pub const fn new() -> Self {
        Self {
            transaction: Mutex::new(RefCell::new(Transaction::new())),
        }
    }

    /// Arm a write of `bytes` to 7-bit `address` and assert a start condition.
    ///
    /// Returns immediately; completion is signalled by the controller
    /// interrupt. Fails with [BusError::Busy] while a previous transaction
    /// is still in flight.
    pub fn submit<C: TwiController + ?Sized>(
        &self,
        controller: &mut C,
        address: u8,
        bytes: &[u8],
    ) -> Result<(), BusError> {
        critical_section::with(|cs| self.transaction.borrow_ref_mut(cs).begin(address, bytes))
            .inspect_err(|e| warn!("submit to {:#x} rejected: {:?}", address, e))?;
        debug!("submit: address {:#x} length {}", address, bytes.len());
        controller.start();
        Ok(())
    }

    /// Controller interrupt handler.
    ///
    /// Reads the status register, advances the transaction and applies the
    /// resulting command to the controller.
    pub fn on_interrupt<C: TwiController + ?Sized>(&self, controller: &mut C) {
        let status = controller.status() & status::MASK;
        let command =
            critical_section::with(|cs| self.transaction.borrow_ref_mut(cs).advance(status));
        match command {
            Command::Transmit(byte) => controller.transmit(byte),
            Command::Stop => controller.stop(),
            Command::None => {}
        }
    }

    pub fn state(&self) -> TwiState {
        critical_section::with(|cs| self.transaction.borrow_ref(cs).state())
    }

    /// Result of the last transaction, `None` while it is in flight.
    pub fn outcome(&self) -> Option<Result<(), BusError>> {
        critical_section::with(|cs| self.transaction.borrow_ref(cs).outcome())
    }

    /// Status code latched by the last failed transaction
    pub fn last_error(&self) -> Option<u8> {
        critical_section::with(|cs| self.transaction.borrow_ref(cs).last_error())
    }

    /// Sleep until the current transaction stops or fails.
    ///
    /// Returns at once when nothing was ever submitted. Waits forever if the
    /// controller stops raising interrupts mid-transaction; see
    /// [BusMaster::await_completion_within] for a bounded wait.
    pub fn await_completion<I: Idle + ?Sized>(&self, idle: &mut I) -> Result<(), BusError> {
        block_until(idle, || !self.in_flight());
        self.finish()
    }

    /// Like [BusMaster::await_completion], giving up after `ticks` ticks of
    /// `clock` with [BusError::Timeout].
    ///
    /// The transaction is not cancelled by a timeout.
    pub fn await_completion_within<I: Idle + ?Sized>(
        &self,
        clock: &Clock,
        ticks: u32,
        idle: &mut I,
    ) -> Result<(), BusError> {
        let start = clock.now();
        block_until(idle, || {
            !self.in_flight() || deadline_reached(clock.now(), start, ticks)
        });
        if self.in_flight() {
            warn!("bus transaction timed out in {:?}", self.state());
            return Err(BusError::Timeout);
        }
        self.finish()
    }

    fn in_flight(&self) -> bool {
        !self.state().is_settled()
    }

    fn finish(&self) -> Result<(), BusError> {
        match self.outcome() {
            Some(Err(e)) => {
                error!("bus transaction failed: {:?}", e);
                Err(e)
            }
            _ => Ok(()),
        }
    }
}
