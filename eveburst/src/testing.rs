//! Test doubles for the capability traits. The crate only links std in
//! test mode, so these can allocate.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::vec::Vec;

use crate::transport::{ChipSelect, DmaChannel, SpiTransport};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CsEvent {
    Select,
    Unselect,
}

/// A test double for `trait ChipSelect` which logs every pin change.
#[derive(Debug, Default)]
pub struct MockChipSelect {
    events: Vec<CsEvent>,
}

impl MockChipSelect {
    pub const fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn events(&self) -> Vec<CsEvent> {
        self.events.clone()
    }

    pub fn is_selected(&self) -> bool {
        self.events.last() == Some(&CsEvent::Select)
    }
}

impl ChipSelect for MockChipSelect {
    fn select(&mut self) {
        self.events.push(CsEvent::Select);
    }

    fn unselect(&mut self) {
        self.events.push(CsEvent::Unselect);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MockSpiError;

/// A test double for `trait SpiTransport`.
///
/// Every transmitted byte is appended to `sent`. Received bytes come from
/// `replies` in order, and are zero once that runs out.
#[derive(Debug, Default)]
pub struct MockSpi {
    pub sent: Vec<u8>,
    pub replies: VecDeque<u8>,

    // if _fail_after is Some then the transport fails once that many bytes
    // have been sent.
    _fail_after: Option<usize>,
}

impl MockSpi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_replies(replies: &[u8]) -> Self {
        Self {
            replies: replies.iter().copied().collect(),
            ..Self::default()
        }
    }

    pub fn failing_after(n: usize) -> Self {
        Self {
            _fail_after: Some(n),
            ..Self::default()
        }
    }
}

impl SpiTransport for MockSpi {
    type Error = MockSpiError;

    fn transmit_byte(&mut self, b: u8) -> Result<u8, MockSpiError> {
        if let Some(limit) = self._fail_after {
            if self.sent.len() >= limit {
                return Err(MockSpiError);
            }
        }
        self.sent.push(b);
        Ok(self.replies.pop_front().unwrap_or(0))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DmaEvent {
    Arm(usize),
    Start,
    Stop,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MockDmaError;

/// What a `MockDma` has been asked to do, shared with the test so it can
/// be inspected while the engine still owns the channel.
#[derive(Debug, Default)]
pub struct DmaLog {
    pub events: Vec<DmaEvent>,

    /// Every byte "transmitted" by the simulated hardware, in order.
    pub sink: Vec<u8>,

    /// Address of the memory most recently armed.
    pub armed_at: Option<usize>,

    pub fail_start: bool,
}

/// A test double for `trait DmaChannel`.
///
/// Starting a transfer copies the armed memory into the log's `sink`
/// immediately, as if the hardware had echoed the buffer to a SPI device.
/// It doesn't raise the completion itself: tests call
/// `BurstSignal::on_transfer_complete` to play the interrupt.
pub struct MockDma {
    log: Rc<RefCell<DmaLog>>,
    armed: Option<(*const u8, usize)>,
}

impl MockDma {
    pub fn new() -> (Self, Rc<RefCell<DmaLog>>) {
        let log = Rc::new(RefCell::new(DmaLog::default()));
        let dma = Self {
            log: log.clone(),
            armed: None,
        };
        (dma, log)
    }
}

impl DmaChannel for MockDma {
    type Error = MockDmaError;

    unsafe fn arm(&mut self, source: *const u8, len: usize) -> Result<(), MockDmaError> {
        let mut log = self.log.borrow_mut();
        log.events.push(DmaEvent::Arm(len));
        log.armed_at = Some(source as usize);
        self.armed = Some((source, len));
        Ok(())
    }

    fn start(&mut self) -> Result<(), MockDmaError> {
        let mut log = self.log.borrow_mut();
        if log.fail_start {
            return Err(MockDmaError);
        }
        log.events.push(DmaEvent::Start);
        if let Some((source, len)) = self.armed {
            // Safety: the engine promises the armed memory stays valid until
            // the transfer completes, and we read it before returning.
            let data = unsafe { core::slice::from_raw_parts(source, len) };
            log.sink.extend_from_slice(data);
        }
        Ok(())
    }

    fn stop(&mut self) {
        self.log.borrow_mut().events.push(DmaEvent::Stop);
        self.armed = None;
    }
}
