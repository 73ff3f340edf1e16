//! The interface shared by the blocking and DMA burst engines.

use crate::address::EveAddress;
use crate::error::BurstError;
use crate::signal::BurstState;

/// Whether a burst engine finishes its transfers synchronously or in the
/// background.
///
/// Callers that use [`BurstTransfer::is_busy`] for backpressure should
/// check this: a blocking engine is never busy, because `end_burst` returns
/// only once every byte has been sent.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransferMode {
    Blocking,
    Dma,
}

/// Implemented by types that can send a burst of command words to an EVE
/// controller in a single SPI transaction.
///
/// A burst is started with `begin_burst`, filled with `write_word`, and
/// handed to the hardware with `end_burst`. Only one burst can be
/// accumulating or in flight at a time.
pub trait BurstTransfer {
    type Error;

    fn mode(&self) -> TransferMode;

    fn state(&self) -> BurstState;

    /// Starts a new burst with an empty buffer.
    ///
    /// Returns [`BurstError::Busy`] without disturbing anything if the
    /// previous burst is still being transferred.
    fn begin_burst(&mut self) -> Result<(), BurstError<Self::Error>>;

    /// Appends one 32-bit word to the current burst, least-significant byte
    /// first.
    fn write_word(&mut self, data: u32) -> Result<(), BurstError<Self::Error>>;

    /// Appends the three-byte memory-write header for `addr`. A burst aimed
    /// at the coprocessor starts with the header for `REG_CMDB_WRITE`.
    fn write_header(&mut self, addr: EveAddress) -> Result<(), BurstError<Self::Error>>;

    /// Finishes accumulating and hands the burst to the hardware.
    fn end_burst(&mut self) -> Result<(), BurstError<Self::Error>>;

    /// Abandons the burst currently accumulating, if any.
    fn discard_burst(&mut self);

    /// Returns true while a previous burst is still being transferred, in
    /// which case no new burst may be started.
    fn is_busy(&self) -> bool;

    /// Number of bytes written into the current burst so far.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Starts a burst that writes into the EVE memory map at `addr`.
    ///
    /// If the header can't be written the burst is discarded again.
    fn begin_burst_to(&mut self, addr: EveAddress) -> Result<(), BurstError<Self::Error>> {
        self.begin_burst()?;
        if let Err(err) = self.write_header(addr) {
            self.discard_burst();
            return Err(err);
        }
        Ok(())
    }

    /// Sends the given words as one complete burst.
    ///
    /// If any word can't be written the partial burst is discarded, so the
    /// engine is ready for another attempt.
    fn write_words(
        &mut self,
        words: impl IntoIterator<Item = u32>,
    ) -> Result<(), BurstError<Self::Error>> {
        self.begin_burst()?;
        for word in words {
            if let Err(err) = self.write_word(word) {
                self.discard_burst();
                return Err(err);
            }
        }
        self.end_burst()
    }
}
