// SPDX-License-Identifier: Apache-2.0

use arrayvec::ArrayVec;

use super::status;
use crate::errors::BusError;

/// Largest payload of a single write transaction
pub const MAX_PAYLOAD: usize = 32;

/// Phase of a write transaction
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TwiState {
    /// Nothing submitted since power-up
    Idle,
    /// Start condition requested, waiting for it to go out
    Starting,
    /// Address byte written, waiting for its acknowledge
    AddressSent,
    /// Payload byte written, waiting for its acknowledge
    DataSending,
    /// Stop condition requested, transaction done
    Stopped,
    /// Unexpected status, transaction abandoned
    Error,
}

impl TwiState {
    /// Terminal or never-started: a new transaction may be submitted.
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Idle | Self::Stopped | Self::Error)
    }
}

/// What the controller has to do after a bus event
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Load the byte into the data register and continue
    Transmit(u8),
    /// Assert a stop condition and release the bus
    Stop,
    /// Nothing to do
    None,
}

/// One write-only master transaction.
///
/// The payload is copied in at [Transaction::begin], callers are free to
/// reuse their buffer as soon as submission returns.
#[derive(Debug)]
pub struct Transaction {
    state: TwiState,
    address: u8,
    payload: ArrayVec<u8, MAX_PAYLOAD>,
    next: usize,
    last_error: Option<u8>,
}

impl Default for Transaction {
    fn default() -> Self {
        Self::new()
    }
}

impl Transaction {
    pub const fn new() -> Self {
        Self {
            state: TwiState::Idle,
            address: 0,
            payload: ArrayVec::new_const(),
            next: 0,
            last_error: None,
        }
    }

    /// Load a new transaction and move to [TwiState::Starting].
    ///
    /// The caller asserts the start condition once this succeeds.
    pub fn begin(&mut self, address: u8, bytes: &[u8]) -> Result<(), BusError> {
        if !self.state.is_settled() {
            return Err(BusError::Busy);
        }
        if address > 0x7f {
            return Err(BusError::InvalidAddress);
        }
        let mut payload = ArrayVec::new();
        payload
            .try_extend_from_slice(bytes)
            .map_err(|_| BusError::PayloadTooLarge)?;
        self.address = address;
        self.payload = payload;
        self.next = 0;
        self.last_error = None;
        self.state = TwiState::Starting;
        Ok(())
    }

    /// Advance on a controller event with (masked) status code `status`.
    ///
    /// Each phase accepts exactly one status code (two for the start phase);
    /// anything else latches the code and ends the transaction in
    /// [TwiState::Error].
    pub fn advance(&mut self, status: u8) -> Command {
        match self.state {
            TwiState::Starting => {
                if status != status::START && status != status::REPEATED_START {
                    return self.fail(status);
                }
                self.state = TwiState::AddressSent;
                Command::Transmit(self.address << 1)
            }
            TwiState::AddressSent => {
                if status != status::SLA_W_ACK {
                    return self.fail(status);
                }
                match self.take_next() {
                    Some(byte) => {
                        self.state = TwiState::DataSending;
                        Command::Transmit(byte)
                    }
                    None => {
                        self.state = TwiState::Stopped;
                        Command::Stop
                    }
                }
            }
            TwiState::DataSending => {
                if status != status::DATA_ACK {
                    return self.fail(status);
                }
                match self.take_next() {
                    Some(byte) => Command::Transmit(byte),
                    None => {
                        self.state = TwiState::Stopped;
                        Command::Stop
                    }
                }
            }
            TwiState::Idle | TwiState::Stopped | TwiState::Error => Command::None,
        }
    }

    fn fail(&mut self, status: u8) -> Command {
        self.last_error = Some(status);
        self.state = TwiState::Error;
        Command::Stop
    }

    fn take_next(&mut self) -> Option<u8> {
        let byte = self.payload.get(self.next).copied()?;
        self.next += 1;
        Some(byte)
    }

    pub fn state(&self) -> TwiState {
        self.state
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    /// Payload bytes not yet handed to the controller
    pub fn remaining(&self) -> usize {
        self.payload.len() - self.next
    }

    /// Status code that ended the last failed transaction
    pub fn last_error(&self) -> Option<u8> {
        self.last_error
    }

    /// `None` while the transaction is in flight or nothing was submitted.
    pub fn outcome(&self) -> Option<Result<(), BusError>> {
        match self.state {
            TwiState::Stopped => Some(Ok(())),
            TwiState::Error => Some(Err(BusError::Status(self.last_error.unwrap_or(0)))),
            _ => None,
        }
    }
}
