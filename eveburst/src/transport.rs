//! Capability traits implemented once per target.
//!
//! The core of this crate never needs to know which microcontroller it is
//! running on. Instead, each target (or each adapter crate, such as
//! `eveburst-hal` for `embedded-hal` implementations) provides
//! implementations of the small traits in this module, and the burst
//! engines are generic over them.

/// A blocking SPI transport which can clock one byte at a time.
///
/// Implementations must have completed the transfer by the time each method
/// returns. Only `transmit_byte` is required; the other methods have default
/// implementations in terms of it which implementations can override with
/// something more efficient, such as a FIFO-based block write.
pub trait SpiTransport {
    type Error;

    /// Clocks one byte out and returns the byte that was clocked in at the
    /// same time.
    fn transmit_byte(&mut self, b: u8) -> Result<u8, Self::Error>;

    fn transmit(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        for b in bytes {
            self.transmit_byte(*b)?;
        }
        Ok(())
    }

    /// Transmits a 32-bit word least-significant byte first, which is the
    /// byte order EVE expects for everything in its memory map.
    fn transmit_word32(&mut self, w: u32) -> Result<(), Self::Error> {
        self.transmit(&w.to_le_bytes())
    }

    /// Fills `into` with bytes clocked in while transmitting zeros.
    fn receive(&mut self, into: &mut [u8]) -> Result<(), Self::Error> {
        for v in into.iter_mut() {
            *v = self.transmit_byte(0x00)?;
        }
        Ok(())
    }
}

impl<T: SpiTransport + ?Sized> SpiTransport for &mut T {
    type Error = T::Error;

    fn transmit_byte(&mut self, b: u8) -> Result<u8, Self::Error> {
        (**self).transmit_byte(b)
    }

    fn transmit(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        (**self).transmit(bytes)
    }

    fn transmit_word32(&mut self, w: u32) -> Result<(), Self::Error> {
        (**self).transmit_word32(w)
    }

    fn receive(&mut self, into: &mut [u8]) -> Result<(), Self::Error> {
        (**self).receive(into)
    }
}

/// Control of the chip select line of one EVE controller.
///
/// `select` drives the line to its asserted level (low, for EVE) and
/// `unselect` releases it. Pin writes on the supported targets can't fail,
/// so neither method returns anything. Adapters over fallible pins must
/// decide for themselves what to do with an error.
pub trait ChipSelect {
    fn select(&mut self);
    fn unselect(&mut self);
}

impl<C: ChipSelect + ?Sized> ChipSelect for &mut C {
    fn select(&mut self) {
        (**self).select()
    }

    fn unselect(&mut self) {
        (**self).unselect()
    }
}

/// A DMA channel wired to transmit memory into the SPI peripheral that the
/// EVE controller is attached to.
///
/// Every successful call to `start` must eventually cause the target's
/// interrupt handler to call exactly one of
/// [`BurstSignal::on_transfer_complete`](crate::BurstSignal::on_transfer_complete)
/// or [`BurstSignal::on_transfer_fault`](crate::BurstSignal::on_transfer_fault),
/// unless the transfer is cancelled with `stop` first.
pub trait DmaChannel {
    type Error;

    /// Configures the channel to transmit `len` bytes starting at `source`.
    ///
    /// When the burst begins with a memory-write header, `source` is one
    /// byte short of a word boundary: the three header bytes come first and
    /// every command word after them is 4-byte aligned. A channel that moves
    /// whole words can send the header with byte-wide transfers and then
    /// switch to word-wide transfers for the rest.
    ///
    /// # Safety
    ///
    /// The caller must guarantee that `source..source+len` stays valid and
    /// unmodified until the transfer has completed, faulted, or been
    /// stopped with `stop`.
    unsafe fn arm(&mut self, source: *const u8, len: usize) -> Result<(), Self::Error>;

    /// Begins the transfer most recently configured with `arm`. This must
    /// not wait for the transfer to finish.
    fn start(&mut self) -> Result<(), Self::Error>;

    /// Cancels any transfer in progress. When this returns the channel must
    /// no longer be reading from the memory it was armed with, and it must
    /// not raise a completion interrupt for the cancelled transfer.
    fn stop(&mut self);
}
