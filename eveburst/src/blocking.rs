use crate::address::EveAddress;
use crate::burst::{BurstTransfer, TransferMode};
use crate::error::BurstError;
use crate::signal::BurstState;
use crate::transport::{ChipSelect, SpiTransport};

/// A burst engine for targets without DMA, which transmits each word as
/// soon as it's written.
///
/// This is the degenerate form of the burst state machine: it goes from
/// `Idle` to `Accumulating` at `begin_burst` and straight back to `Idle` at
/// `end_burst`, and is never busy. Chip select is asserted for the whole
/// burst, and released again if the engine is dropped part way through
/// one.
pub struct BlockingBurst<T, C>
where
    T: SpiTransport,
    C: ChipSelect,
{
    spi: T,
    cs: C,
    state: BurstState,
    written: usize,
}

impl<T, C> BlockingBurst<T, C>
where
    T: SpiTransport,
    C: ChipSelect,
{
    pub fn new(spi: T, cs: C) -> Self {
        Self {
            spi,
            cs,
            state: BurstState::Idle,
            written: 0,
        }
    }

    fn expect_accumulating(&self) -> Result<(), BurstError<T::Error>> {
        if self.state == BurstState::Accumulating {
            Ok(())
        } else {
            #[cfg(feature = "log")]
            log::warn!("burst write with no burst in progress");
            Err(BurstError::NotAccumulating)
        }
    }
}

impl<T, C> BurstTransfer for BlockingBurst<T, C>
where
    T: SpiTransport,
    C: ChipSelect,
{
    type Error = T::Error;

    fn mode(&self) -> TransferMode {
        TransferMode::Blocking
    }

    fn state(&self) -> BurstState {
        self.state
    }

    fn begin_burst(&mut self) -> Result<(), BurstError<T::Error>> {
        if self.state == BurstState::Accumulating {
            // The bytes already sent can't be recalled, so the best we can do
            // is end that transaction and start a fresh one.
            #[cfg(feature = "log")]
            log::warn!("burst restarted after {} bytes", self.written);
            self.cs.unselect();
        }
        self.cs.select();
        self.state = BurstState::Accumulating;
        self.written = 0;
        Ok(())
    }

    fn write_word(&mut self, data: u32) -> Result<(), BurstError<T::Error>> {
        self.expect_accumulating()?;
        BurstError::transport_result(self.spi.transmit_word32(data))?;
        self.written += 4;
        Ok(())
    }

    fn write_header(&mut self, addr: EveAddress) -> Result<(), BurstError<T::Error>> {
        self.expect_accumulating()?;
        BurstError::transport_result(self.spi.transmit(&addr.write_header()))?;
        self.written += EveAddress::WRITE_HEADER_LEN;
        Ok(())
    }

    fn end_burst(&mut self) -> Result<(), BurstError<T::Error>> {
        self.expect_accumulating()?;
        self.cs.unselect();
        self.state = BurstState::Idle;
        #[cfg(feature = "log")]
        log::trace!("burst of {} bytes sent", self.written);
        Ok(())
    }

    fn discard_burst(&mut self) {
        if self.state == BurstState::Accumulating {
            self.cs.unselect();
            self.state = BurstState::Idle;
        }
        self.written = 0;
    }

    fn is_busy(&self) -> bool {
        false
    }

    fn len(&self) -> usize {
        self.written
    }
}

impl<T, C> Drop for BlockingBurst<T, C>
where
    T: SpiTransport,
    C: ChipSelect,
{
    fn drop(&mut self) {
        self.discard_burst();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::REG_CMDB_WRITE;
    use crate::testing::{CsEvent, MockChipSelect, MockSpi, MockSpiError};

    #[test]
    fn test_words_sent_little_endian() {
        let mut spi = MockSpi::new();
        let mut cs = MockChipSelect::new();
        {
            let mut burst = BlockingBurst::new(&mut spi, &mut cs);
            burst.begin_burst().unwrap();
            burst.write_word(0x11223344).unwrap();
            assert!(!burst.is_busy());
            burst.write_word(0xAABBCCDD).unwrap();
            assert_eq!(burst.len(), 8);
            burst.end_burst().unwrap();
            assert!(!burst.is_busy());
            assert_eq!(burst.state(), BurstState::Idle);
        }
        assert_eq!(
            spi.sent,
            vec![0x44, 0x33, 0x22, 0x11, 0xDD, 0xCC, 0xBB, 0xAA]
        );
        assert_eq!(cs.events(), vec![CsEvent::Select, CsEvent::Unselect]);
    }

    #[test]
    fn test_drop_releases_cs() {
        let mut spi = MockSpi::new();
        let mut cs = MockChipSelect::new();
        {
            let mut burst = BlockingBurst::new(&mut spi, &mut cs);
            burst.begin_burst_to(REG_CMDB_WRITE).unwrap();
            burst.write_word(0xffffff00).unwrap();
        }
        assert_eq!(cs.events(), vec![CsEvent::Select, CsEvent::Unselect]);
        assert_eq!(spi.sent, vec![0xb0, 0x25, 0x78, 0x00, 0xff, 0xff, 0xff]);
    }

    #[test]
    fn test_failed_header_discards_burst() {
        let mut spi = MockSpi::failing_after(1);
        let mut cs = MockChipSelect::new();
        let mut burst = BlockingBurst::new(&mut spi, &mut cs);
        assert_eq!(
            burst.begin_burst_to(REG_CMDB_WRITE),
            Err(BurstError::Transport(MockSpiError))
        );
        assert_eq!(burst.state(), BurstState::Idle);
        assert_eq!(burst.write_word(1), Err(BurstError::NotAccumulating));
        drop(burst);
        assert_eq!(cs.events(), vec![CsEvent::Select, CsEvent::Unselect]);
    }

    #[test]
    fn test_write_outside_burst() {
        let mut spi = MockSpi::new();
        let mut cs = MockChipSelect::new();
        {
            let mut burst = BlockingBurst::new(&mut spi, &mut cs);
            assert_eq!(burst.write_word(1), Err(BurstError::NotAccumulating));
            assert_eq!(burst.end_burst(), Err(BurstError::NotAccumulating));
        }
        assert!(spi.sent.is_empty());
        assert!(cs.events().is_empty());
    }

    #[test]
    fn test_index_resets_each_burst() {
        let mut burst = BlockingBurst::new(MockSpi::new(), MockChipSelect::new());
        burst.write_words(vec![1, 2, 3]).unwrap();
        burst.begin_burst().unwrap();
        assert_eq!(burst.len(), 0);
        burst.end_burst().unwrap();
    }

    #[test]
    fn test_transport_failure_discards_burst() {
        let mut spi = MockSpi::failing_after(6);
        let mut cs = MockChipSelect::new();
        {
            let mut burst = BlockingBurst::new(&mut spi, &mut cs);
            let result = burst.write_words(vec![0x01020304, 0x05060708]);
            assert_eq!(result, Err(BurstError::Transport(MockSpiError)));
            assert_eq!(burst.state(), BurstState::Idle);
        }
        assert_eq!(spi.sent, vec![0x04, 0x03, 0x02, 0x01, 0x08, 0x07]);
        assert!(!cs.is_selected());
    }
}
