#![cfg_attr(not(test), no_std)]

use core::convert::Infallible;

use embedded_hal::blocking::spi::{Transfer, Write};
use embedded_hal::digital::v2::OutputPin;
use eveburst::{ChipSelect, Host, SpiTransport};

/// `EVEHALSPI` is an implementation of `eveburst::SpiTransport` that
/// communicates using the `embedded-hal` blocking SPI traits.
pub struct EVEHALSPI<SPI>
where
    SPI: Transfer<u8> + Write<u8>,
{
    spi: SPI,
}

impl<SPI> EVEHALSPI<SPI>
where
    SPI: Transfer<u8> + Write<u8>,
{
    pub fn new(spi: SPI) -> Self {
        Self { spi: spi }
    }

    pub fn release(self) -> SPI {
        self.spi
    }
}

impl<SPI> SpiTransport for EVEHALSPI<SPI>
where
    SPI: Transfer<u8> + Write<u8>,
{
    type Error = EVEHALSPIError<<SPI as Write<u8>>::Error, <SPI as Transfer<u8>>::Error>;

    fn transmit_byte(&mut self, b: u8) -> Result<u8, Self::Error> {
        let mut words: [u8; 1] = [b];
        Self::Error::spi_transfer_result(self.spi.transfer(&mut words))?;
        Ok(words[0])
    }

    fn transmit(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        Self::Error::spi_write_result(self.spi.write(bytes))
    }

    fn receive(&mut self, into: &mut [u8]) -> Result<(), Self::Error> {
        for v in into.iter_mut() {
            *v = 0;
        }
        Self::Error::spi_transfer_result(self.spi.transfer(into))?;
        Ok(())
    }
}

/// `EVEHALChipSelect` drives the EVE chip select line through an
/// `embedded-hal` output pin.
///
/// The pin is set low to assert chip select, or high to unassert it,
/// reflecting the physical characteristics of the CS pin on EVE IC
/// packages. Only infallible pins are accepted, because chip select is
/// also released from the DMA completion interrupt where there's nobody
/// to report an error to.
pub struct EVEHALChipSelect<CS>
where
    CS: OutputPin<Error = Infallible>,
{
    cs: CS,
}

impl<CS> EVEHALChipSelect<CS>
where
    CS: OutputPin<Error = Infallible>,
{
    pub fn new(cs: CS) -> Self {
        Self { cs: cs }
    }

    pub fn release(self) -> CS {
        self.cs
    }
}

impl<CS> ChipSelect for EVEHALChipSelect<CS>
where
    CS: OutputPin<Error = Infallible>,
{
    fn select(&mut self) {
        match self.cs.set_low() {
            Ok(()) => {}
            Err(never) => match never {},
        }
    }

    fn unselect(&mut self) {
        match self.cs.set_high() {
            Ok(()) => {}
            Err(never) => match never {},
        }
    }
}

/// Create a new [`Host`] in terms of the given SPI bus and CS signal
/// implementations.
pub fn new_host<SPI, CS>(spi: SPI, cs: CS) -> Host<EVEHALSPI<SPI>, EVEHALChipSelect<CS>>
where
    SPI: Transfer<u8> + Write<u8>,
    CS: OutputPin<Error = Infallible>,
{
    Host::new(EVEHALSPI::new(spi), EVEHALChipSelect::new(cs))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EVEHALSPIError<SPIWriteError, SPITransferError> {
    SPIWrite(SPIWriteError),
    SPITransfer(SPITransferError),
}

impl<SPIWriteError, SPITransferError> EVEHALSPIError<SPIWriteError, SPITransferError> {
    fn spi_write_result<T>(r: Result<T, SPIWriteError>) -> Result<T, Self> {
        match r {
            Ok(v) => Ok(v),
            Err(e) => Err(Self::SPIWrite(e)),
        }
    }

    fn spi_transfer_result<T>(r: Result<T, SPITransferError>) -> Result<T, Self> {
        match r {
            Ok(v) => Ok(v),
            Err(e) => Err(Self::SPITransfer(e)),
        }
    }
}
