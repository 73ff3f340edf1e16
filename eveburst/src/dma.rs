use core::sync::atomic::{fence, Ordering};

use crate::address::EveAddress;
use crate::burst::{BurstTransfer, TransferMode};
use crate::config::BurstConfig;
use crate::error::BurstError;
use crate::signal::{BurstSignal, BurstState};
use crate::transport::{ChipSelect, DmaChannel};

/// A burst engine which collects command words in memory and then sends
/// them in the background using a DMA channel.
///
/// `end_burst` returns as soon as the DMA channel has been started. From
/// then until the target's interrupt handler calls
/// [`BurstSignal::on_transfer_complete`] the engine is busy: `is_busy`
/// returns true and `begin_burst` is rejected with [`BurstError::Busy`].
/// The host processor is free to do other work in the meantime, but it
/// must not start another burst.
///
/// The engine borrows its buffer for its whole life and is the only thing
/// that writes into it. While a transfer is in flight the buffer belongs to
/// the DMA channel; the engine only touches it again once the completion
/// interrupt has fired, or once it has stopped the channel itself.
///
/// A burst that starts with a memory-write header is stored one byte into
/// the buffer, so that the command words following the three header bytes
/// stay on 4-byte boundaries when the buffer itself is word-aligned (as
/// [`BurstBuffer`](crate::BurstBuffer) is). The pad byte is never sent.
pub struct DmaBurst<'a, D, C>
where
    D: DmaChannel,
    C: ChipSelect,
{
    signal: &'a BurstSignal<C>,
    dma: D,
    buffer: &'a mut [u8],
    // The burst occupies buffer[start..index]; start is 1 when padded.
    start: usize,
    index: usize,
    config: BurstConfig,
}

impl<'a, D, C> DmaBurst<'a, D, C>
where
    D: DmaChannel,
    C: ChipSelect,
{
    /// Creates an engine that accumulates bursts in `buffer` and sends them
    /// with `dma`, reporting busy state through `signal`.
    ///
    /// The capacity of a burst is the length of `buffer`, which is usually
    /// a [`BurstBuffer`](crate::BurstBuffer) of `BURST_BUFFER_LEN` bytes.
    pub fn new(signal: &'a BurstSignal<C>, dma: D, buffer: &'a mut [u8]) -> Self {
        Self {
            signal,
            dma,
            buffer,
            start: 0,
            index: 0,
            config: BurstConfig::DEFAULT,
        }
    }

    pub fn with_config(mut self, config: BurstConfig) -> Self {
        self.config = config;
        self
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// The bytes of the current (or most recently sent) burst.
    pub fn buffered(&self) -> &[u8] {
        &self.buffer[self.start..self.index]
    }

    /// Busy-waits until the outstanding transfer, if any, completes.
    ///
    /// If the busy flag is still set after polling it `poll_limit` times
    /// (from the engine's [`BurstConfig`]) then the DMA channel is stopped,
    /// chip select is released and the engine returns to idle, reporting
    /// [`BurstError::TransferTimeout`]. A fault staged by the interrupt
    /// handler is reported as [`BurstError::TransferFault`], also leaving
    /// the engine idle.
    pub fn wait_idle(&mut self) -> Result<(), BurstError<D::Error>> {
        let mut polls: u32 = 0;
        loop {
            match self.signal.state() {
                BurstState::Transferring if polls < self.config.poll_limit => {
                    polls += 1;
                    core::hint::spin_loop();
                }
                BurstState::Transferring => break,
                BurstState::Faulted => return self.recover_fault(),
                BurstState::Idle | BurstState::Accumulating => return Ok(()),
            }
        }

        if self.cancel_transfer() {
            #[cfg(feature = "log")]
            log::error!("burst of {} bytes timed out", self.len());
            #[cfg(feature = "defmt")]
            defmt::error!("burst of {} bytes timed out", self.len());
            return Err(BurstError::TransferTimeout);
        }
        // The interrupt got there first while we were stopping the channel.
        match self.signal.state() {
            BurstState::Faulted => self.recover_fault(),
            _ => Ok(()),
        }
    }

    /// Abandons whatever the engine is doing and returns it to idle.
    ///
    /// An in-flight transfer is stopped at the DMA channel before the
    /// buffer is released, so it's safe to start a new burst afterwards.
    pub fn abort(&mut self) {
        match self.signal.state() {
            BurstState::Transferring => {
                self.cancel_transfer();
            }
            BurstState::Faulted => {
                self.signal.transition(BurstState::Faulted, BurstState::Idle);
            }
            BurstState::Accumulating => self.signal.set(BurstState::Idle),
            BurstState::Idle => {}
        }
        self.start = 0;
        self.index = 0;
    }

    // Stops the DMA channel and, if the completion interrupt didn't already
    // do so, moves from Transferring to Idle and releases chip select.
    // Returns true if this call made the transition.
    fn cancel_transfer(&mut self) -> bool {
        self.dma.stop();
        // The channel must be observed stopped before the buffer is touched
        // again.
        fence(Ordering::SeqCst);
        if self.signal.transition(BurstState::Transferring, BurstState::Idle) {
            self.signal.unselect();
            true
        } else {
            false
        }
    }

    fn recover_fault(&mut self) -> Result<(), BurstError<D::Error>> {
        self.signal.transition(BurstState::Faulted, BurstState::Idle);
        #[cfg(feature = "log")]
        log::error!("burst of {} bytes faulted", self.len());
        #[cfg(feature = "defmt")]
        defmt::error!("burst of {} bytes faulted", self.len());
        Err(BurstError::TransferFault)
    }

    fn expect_accumulating(&self) -> Result<(), BurstError<D::Error>> {
        match self.signal.state() {
            BurstState::Accumulating => Ok(()),
            BurstState::Transferring => Err(BurstError::Busy),
            BurstState::Idle | BurstState::Faulted => {
                #[cfg(feature = "log")]
                log::warn!("burst write with no burst in progress");
                Err(BurstError::NotAccumulating)
            }
        }
    }

    fn append(&mut self, data: &[u8]) -> Result<(), BurstError<D::Error>> {
        self.expect_accumulating()?;
        let end = self.index + data.len();
        if end > self.buffer.len() {
            return Err(BurstError::BufferOverflow {
                capacity: self.buffer.len(),
            });
        }
        self.buffer[self.index..end].copy_from_slice(data);
        self.index = end;
        Ok(())
    }
}

impl<'a, D, C> BurstTransfer for DmaBurst<'a, D, C>
where
    D: DmaChannel,
    C: ChipSelect,
{
    type Error = D::Error;

    fn mode(&self) -> TransferMode {
        TransferMode::Dma
    }

    fn state(&self) -> BurstState {
        self.signal.state()
    }

    fn begin_burst(&mut self) -> Result<(), BurstError<D::Error>> {
        match self.signal.state() {
            BurstState::Transferring => {
                #[cfg(feature = "log")]
                log::warn!("burst started while previous burst in flight");
                return Err(BurstError::Busy);
            }
            BurstState::Faulted => return self.recover_fault(),
            BurstState::Idle | BurstState::Accumulating => {}
        }
        self.start = 0;
        self.index = 0;
        self.signal.set(BurstState::Accumulating);
        Ok(())
    }

    fn write_word(&mut self, data: u32) -> Result<(), BurstError<D::Error>> {
        self.append(&data.to_le_bytes())
    }

    fn write_header(&mut self, addr: EveAddress) -> Result<(), BurstError<D::Error>> {
        self.expect_accumulating()?;
        let padded = self.index == 0;
        if padded {
            self.start = 1;
            self.index = 1;
        }
        let result = self.append(&addr.write_header());
        if result.is_err() && padded {
            self.start = 0;
            self.index = 0;
        }
        result
    }

    fn end_burst(&mut self) -> Result<(), BurstError<D::Error>> {
        self.expect_accumulating()?;
        if self.index == self.start {
            // Nothing to send, so there will be no completion interrupt.
            self.signal.set(BurstState::Idle);
            return Ok(());
        }

        // Buffer writes must land before the DMA channel can fetch them.
        fence(Ordering::SeqCst);
        // Safety: the buffer is borrowed for 'a and we don't write to it
        // again until the transfer completes or we have stopped the channel,
        // which Drop also guarantees.
        let burst = &self.buffer[self.start..self.index];
        let armed = unsafe { self.dma.arm(burst.as_ptr(), burst.len()) };
        if let Err(err) = armed {
            self.signal.set(BurstState::Idle);
            return Err(BurstError::Transport(err));
        }

        self.signal.select();
        // Busy must be visible before the channel can possibly finish and
        // raise its interrupt.
        self.signal.set(BurstState::Transferring);
        if let Err(err) = self.dma.start() {
            self.cancel_transfer();
            return Err(BurstError::Transport(err));
        }
        #[cfg(feature = "log")]
        log::trace!("burst of {} bytes handed to DMA", self.len());
        Ok(())
    }

    fn discard_burst(&mut self) {
        if self.signal.state() == BurstState::Accumulating {
            self.signal.set(BurstState::Idle);
            self.start = 0;
            self.index = 0;
        }
    }

    fn is_busy(&self) -> bool {
        self.signal.is_busy()
    }

    fn len(&self) -> usize {
        self.index - self.start
    }
}

impl<'a, D, C> Drop for DmaBurst<'a, D, C>
where
    D: DmaChannel,
    C: ChipSelect,
{
    fn drop(&mut self) {
        // The buffer borrow ends here, so the channel must not outlive it.
        // The signal can outlive us too, so leave it ready for a new engine.
        match self.signal.state() {
            BurstState::Transferring => {
                self.cancel_transfer();
            }
            BurstState::Accumulating => self.discard_burst(),
            BurstState::Idle | BurstState::Faulted => {}
        }
    }
}
