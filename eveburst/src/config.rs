//! Sizes and tuning parameters for the burst engines.

/// Capacity in bytes of a burst buffer: a full 4 KiB coprocessor FIFO's
/// worth of command words plus one word holding the three-byte
/// memory-write header and its pad byte.
pub const BURST_BUFFER_LEN: usize = 4100;

/// `BURST_BUFFER_LEN` expressed in 32-bit words, for targets that declare
/// their buffer as a `u32` array.
pub const BURST_BUFFER_WORDS: usize = BURST_BUFFER_LEN / 4;

/// Default number of times [`DmaBurst::wait_idle`](crate::DmaBurst::wait_idle)
/// polls the busy flag before giving up.
pub const DEFAULT_POLL_LIMIT: u32 = 1_000_000;

/// Storage for a DMA burst buffer.
///
/// The storage is word-aligned so that DMA controllers can fetch it a word
/// at a time, and `new` is a `const fn` so the buffer can be statically
/// allocated:
///
/// ```ignore
/// static mut BURST_BUFFER: BurstBuffer = BurstBuffer::new();
/// ```
#[repr(C, align(4))]
pub struct BurstBuffer<const N: usize = BURST_BUFFER_LEN>([u8; N]);

impl<const N: usize> BurstBuffer<N> {
    pub const fn new() -> Self {
        Self([0; N])
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.0[..]
    }
}

impl<const N: usize> Default for BurstBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Runtime settings for a [`DmaBurst`](crate::DmaBurst).
///
/// This behaves as a "builder" type, with methods that return a modified
/// copy. The default value matches `DEFAULT_POLL_LIMIT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BurstConfig {
    pub poll_limit: u32,
}

impl BurstConfig {
    pub const DEFAULT: Self = Self {
        poll_limit: DEFAULT_POLL_LIMIT,
    };

    /// Sets how many times `wait_idle` polls the busy flag before
    /// reporting a timeout. The right value depends on how fast the host
    /// processor polls relative to the SPI clock; a full buffer at 8MHz
    /// takes a little over four milliseconds to send.
    pub const fn poll_limit(self, poll_limit: u32) -> Self {
        Self { poll_limit }
    }
}

impl Default for BurstConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}
