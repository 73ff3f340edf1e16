//! State shared between the foreground burst engine and the DMA completion
//! interrupt.

use core::cell::RefCell;
use core::convert::TryFrom;

use critical_section::Mutex;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use portable_atomic::{AtomicU8, Ordering};

use crate::transport::ChipSelect;

/// The states of a burst engine.
///
/// A [`BlockingBurst`](crate::BlockingBurst) only ever visits `Idle` and
/// `Accumulating`, because its transfers finish before `end_burst` returns.
#[derive(Clone, Copy, PartialEq, Eq, Debug, IntoPrimitive, TryFromPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum BurstState {
    Idle = 0,
    Accumulating = 1,
    Transferring = 2,
    Faulted = 3,
}

/// The busy flag and chip select line of one DMA burst engine, shared with
/// the interrupt handler that observes DMA completion.
///
/// This is typically placed in a `static` so that the interrupt handler can
/// reach it:
///
/// ```ignore
/// static SIGNAL: BurstSignal<EveCs> = BurstSignal::new(EveCs);
///
/// #[interrupt]
/// fn DMAC_0() {
///     clear_dma_interrupt_flags();
///     SIGNAL.on_transfer_complete();
/// }
/// ```
///
/// The state is the only memory both contexts write. Each transition out of
/// `Transferring` is a compare-and-swap, so when a completion interrupt
/// races with a timeout or abort in the foreground exactly one of them
/// takes effect and releases chip select.
pub struct BurstSignal<C> {
    state: AtomicU8,
    cs: Mutex<RefCell<C>>,
}

impl<C> BurstSignal<C> {
    pub const fn new(cs: C) -> Self {
        Self {
            state: AtomicU8::new(BurstState::Idle as u8),
            cs: Mutex::new(RefCell::new(cs)),
        }
    }
}

impl<C: ChipSelect> BurstSignal<C> {
    pub fn state(&self) -> BurstState {
        let raw = self.state.load(Ordering::Acquire);
        match BurstState::try_from(raw) {
            Ok(state) => state,
            // Only this module stores into `state`, always from a
            // `BurstState`.
            Err(_) => BurstState::Faulted,
        }
    }

    /// Returns true while a DMA transfer is outstanding.
    pub fn is_busy(&self) -> bool {
        self.state() == BurstState::Transferring
    }

    /// Call from the DMA completion interrupt handler.
    ///
    /// Clears the busy state and releases chip select. Returns `false`,
    /// without doing anything, if no transfer was outstanding; an interrupt
    /// handler can use the result to decide whether to start any follow-on
    /// work it queued while the transfer was running.
    ///
    /// This never blocks and never allocates. The chip select line is
    /// accessed inside a critical section, which the foreground only holds
    /// for the duration of a single pin write.
    pub fn on_transfer_complete(&self) -> bool {
        if self.transition(BurstState::Transferring, BurstState::Idle) {
            self.unselect();
            true
        } else {
            false
        }
    }

    /// Call from the DMA interrupt handler when the hardware reports a
    /// transfer error.
    ///
    /// Releases chip select and stages the fault, which the foreground then
    /// observes as [`BurstError::TransferFault`](crate::BurstError::TransferFault)
    /// on its next call into the engine.
    pub fn on_transfer_fault(&self) -> bool {
        if self.transition(BurstState::Transferring, BurstState::Faulted) {
            self.unselect();
            true
        } else {
            false
        }
    }

    /// Returns a [`ChipSelect`] implementation that drives the shared line,
    /// for use with out-of-burst transfers through a [`Host`](crate::Host).
    ///
    /// The caller must make sure no burst is in flight before using it.
    pub fn chip_select(&self) -> SharedChipSelect<'_, C> {
        SharedChipSelect { signal: self }
    }

    pub(crate) fn transition(&self, from: BurstState, to: BurstState) -> bool {
        self.state
            .compare_exchange(from.into(), to.into(), Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub(crate) fn set(&self, to: BurstState) {
        self.state.store(to.into(), Ordering::Release);
    }

    pub(crate) fn select(&self) {
        critical_section::with(|cs| self.cs.borrow_ref_mut(cs).select());
    }

    pub(crate) fn unselect(&self) {
        critical_section::with(|cs| self.cs.borrow_ref_mut(cs).unselect());
    }

    #[cfg(test)]
    pub(crate) fn inspect_cs<R>(&self, f: impl FnOnce(&C) -> R) -> R {
        critical_section::with(|cs| f(&self.cs.borrow_ref(cs)))
    }
}

/// Borrowed access to the chip select line held in a [`BurstSignal`].
pub struct SharedChipSelect<'a, C> {
    signal: &'a BurstSignal<C>,
}

impl<'a, C: ChipSelect> ChipSelect for SharedChipSelect<'a, C> {
    fn select(&mut self) {
        self.signal.select()
    }

    fn unselect(&mut self) {
        self.signal.unselect()
    }
}
