//! Error types returned by the burst engines and host access.

/// Error type for burst and host operations.
///
/// `E` is the error type of whichever collaborator the operation talks to:
/// the [`SpiTransport`](crate::SpiTransport) error for blocking operations,
/// or the [`DmaChannel`](crate::DmaChannel) error for DMA bursts.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BurstError<E> {
    /// A new burst was requested while the previous one is still being
    /// transferred.
    ///
    /// Nothing about the in-flight transfer is disturbed when this is
    /// returned, so the caller can poll `is_busy` and try again later.
    Busy,

    /// A word was written, or the burst ended, without a burst having been
    /// started first.
    NotAccumulating,

    /// The buffer has no room left for the data being written. The buffer
    /// contents and write index are unchanged.
    BufferOverflow { capacity: usize },

    /// A transfer didn't report completion within the configured poll
    /// limit. The DMA channel has been stopped and the engine is idle
    /// again.
    TransferTimeout,

    /// The interrupt handler reported a hardware fault for the most recent
    /// transfer. The engine is idle again, so the burst can be retried.
    TransferFault,

    /// Errors from the SPI transport or DMA channel.
    Transport(E),
}

impl<E> BurstError<E> {
    pub(crate) fn transport_result<R>(r: Result<R, E>) -> Result<R, Self> {
        match r {
            Ok(v) => Ok(v),
            Err(err) => Err(BurstError::Transport(err)),
        }
    }

    /// Returns true for the errors caused by calling the burst API out of
    /// sequence, as opposed to errors reported by the hardware.
    pub fn is_protocol_error(&self) -> bool {
        matches!(
            self,
            BurstError::Busy | BurstError::NotAccumulating | BurstError::BufferOverflow { .. }
        )
    }
}

impl<E: core::fmt::Debug> core::fmt::Display for BurstError<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            BurstError::Busy => write!(f, "a burst transfer is still in progress"),
            BurstError::NotAccumulating => write!(f, "no burst has been started"),
            BurstError::BufferOverflow { capacity } => {
                write!(f, "burst exceeds buffer capacity of {} bytes", capacity)
            }
            BurstError::TransferTimeout => write!(f, "burst transfer timed out"),
            BurstError::TransferFault => write!(f, "burst transfer faulted"),
            BurstError::Transport(err) => write!(f, "transport error: {:?}", err),
        }
    }
}
