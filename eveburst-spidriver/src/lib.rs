#![cfg_attr(not(test), no_std)]

use core::cell::{Cell, RefCell};

use embedded_hal::serial::{Read, Write};
use eveburst::{ChipSelect, Host, SpiTransport};
use spidriver::SPIDriver;

// The SPIDriver protocol carries at most this many bytes per write or
// transfer command.
const MAX_CHUNK: usize = 64;

/// `EVESPIDriver` adapts an Excamera SPIDriver so that it can serve as both
/// the SPI transport and the chip select line for an EVE controller.
///
/// The SPIDriver drives its own CS line, so both halves share the one
/// device. Borrow them with `transport` and `chip_select`, or use `host` to
/// get a ready-made [`Host`].
pub struct EVESPIDriver<TX, RX>
where
    TX: Write<u8>,
    RX: Read<u8>,
{
    sd: RefCell<SPIDriver<TX, RX>>,

    // Set when the SPIDriver rejects a select or unselect, which the
    // ChipSelect trait can't report. The next transport call fails instead.
    cs_failed: Cell<bool>,
}

impl<TX, RX> EVESPIDriver<TX, RX>
where
    TX: Write<u8>,
    RX: Read<u8>,
{
    pub fn new(sd: SPIDriver<TX, RX>) -> Self {
        Self {
            sd: RefCell::new(sd),
            cs_failed: Cell::new(false),
        }
    }

    pub fn transport(&self) -> EVESPIDriverTransport<'_, TX, RX> {
        EVESPIDriverTransport { dev: self }
    }

    pub fn chip_select(&self) -> EVESPIDriverChipSelect<'_, TX, RX> {
        EVESPIDriverChipSelect { dev: self }
    }

    pub fn host(&self) -> EVESPIDriverHost<'_, TX, RX> {
        Host::new(self.transport(), self.chip_select())
    }

    fn check_cs(&self) -> Result<(), EVESPIDriverError<TX::Error, RX::Error>> {
        if self.cs_failed.replace(false) {
            Err(EVESPIDriverError::ChipSelect)
        } else {
            Ok(())
        }
    }
}

pub type EVESPIDriverHost<'a, TX, RX> =
    Host<EVESPIDriverTransport<'a, TX, RX>, EVESPIDriverChipSelect<'a, TX, RX>>;

pub struct EVESPIDriverTransport<'a, TX, RX>
where
    TX: Write<u8>,
    RX: Read<u8>,
{
    dev: &'a EVESPIDriver<TX, RX>,
}

impl<'a, TX, RX> SpiTransport for EVESPIDriverTransport<'a, TX, RX>
where
    TX: Write<u8>,
    RX: Read<u8>,
{
    type Error = EVESPIDriverError<TX::Error, RX::Error>;

    fn transmit_byte(&mut self, b: u8) -> Result<u8, Self::Error> {
        self.dev.check_cs()?;
        let mut words: [u8; 1] = [b];
        self.dev.sd.borrow_mut().transfer(&mut words)?;
        Ok(words[0])
    }

    fn transmit(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        self.dev.check_cs()?;
        let mut sd = self.dev.sd.borrow_mut();
        for chunk in bytes.chunks(MAX_CHUNK) {
            sd.write(chunk)?;
        }
        Ok(())
    }

    fn receive(&mut self, into: &mut [u8]) -> Result<(), Self::Error> {
        self.dev.check_cs()?;
        let mut sd = self.dev.sd.borrow_mut();
        for chunk in into.chunks_mut(MAX_CHUNK) {
            for v in chunk.iter_mut() {
                *v = 0;
            }
            sd.transfer(chunk)?;
        }
        Ok(())
    }
}

pub struct EVESPIDriverChipSelect<'a, TX, RX>
where
    TX: Write<u8>,
    RX: Read<u8>,
{
    dev: &'a EVESPIDriver<TX, RX>,
}

impl<'a, TX, RX> ChipSelect for EVESPIDriverChipSelect<'a, TX, RX>
where
    TX: Write<u8>,
    RX: Read<u8>,
{
    fn select(&mut self) {
        if self.dev.sd.borrow_mut().select().is_err() {
            self.dev.cs_failed.set(true);
        }
    }

    fn unselect(&mut self) {
        if self.dev.sd.borrow_mut().unselect().is_err() {
            self.dev.cs_failed.set(true);
        }
    }
}

#[derive(Debug)]
pub enum EVESPIDriverError<TXError, RXError> {
    /// Communication with the SPIDriver failed.
    Comm(spidriver::Error<TXError, RXError>),

    /// The SPIDriver failed to change its chip select line during an
    /// earlier operation.
    ChipSelect,
}

impl<TXError, RXError> From<spidriver::Error<TXError, RXError>>
    for EVESPIDriverError<TXError, RXError>
{
    fn from(err: spidriver::Error<TXError, RXError>) -> Self {
        EVESPIDriverError::Comm(err)
    }
}
