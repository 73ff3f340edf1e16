use crate::address::{EveAddress, REG_ID, REG_ID_VALUE, ROM_CHIPID};
use crate::blocking::BlockingBurst;
use crate::host_commands::HostCmd;
use crate::transport::{ChipSelect, SpiTransport};

/// `Host` performs single blocking transactions with an EVE controller,
/// outside of any command burst: host commands, and reads and writes of
/// individual values in the memory map.
///
/// This matches the primitive operations used in the Programmers Guides
/// for the various EVE controllers. Values are transferred little-endian,
/// as they are stored in EVE memory.
///
/// On a DMA target the same SPI peripheral and chip select line are also
/// used by a [`DmaBurst`](crate::DmaBurst), so check that the burst engine
/// isn't busy before using `Host`.
pub struct Host<T, C> {
    spi: T,
    cs: C,
}

impl<T, C> Host<T, C>
where
    T: SpiTransport,
    C: ChipSelect,
{
    pub fn new(spi: T, cs: C) -> Self {
        Self { spi, cs }
    }

    /// Consumes the host and returns its underlying transport and chip
    /// select.
    pub fn release(self) -> (T, C) {
        (self.spi, self.cs)
    }

    /// Borrows the host's transport as a blocking burst engine.
    pub fn burst(&mut self) -> BlockingBurst<&mut T, &mut C> {
        BlockingBurst::new(&mut self.spi, &mut self.cs)
    }

    fn with_cs<F, R>(&mut self, func: F) -> Result<R, T::Error>
    where
        F: FnOnce(&mut T) -> Result<R, T::Error>,
    {
        self.cs.select();
        let result = func(&mut self.spi);
        self.cs.unselect();
        result
    }

    pub fn host_command(&mut self, cmd: HostCmd, a0: u8) -> Result<(), T::Error> {
        let mut msg: [u8; 3] = [0; 3];
        cmd.build_message(a0, 0, &mut msg);
        self.with_cs(|spi| spi.transmit(&msg))
    }

    pub fn wr8s(&mut self, addr: EveAddress, v: &[u8]) -> Result<(), T::Error> {
        self.with_cs(|spi| {
            spi.transmit(&addr.write_header())?;
            spi.transmit(v)
        })
    }

    pub fn wr8(&mut self, addr: EveAddress, v: u8) -> Result<(), T::Error> {
        self.wr8s(addr, &[v])
    }

    pub fn wr16(&mut self, addr: EveAddress, v: u16) -> Result<(), T::Error> {
        self.wr8s(addr, &v.to_le_bytes())
    }

    pub fn wr32(&mut self, addr: EveAddress, v: u32) -> Result<(), T::Error> {
        self.wr8s(addr, &v.to_le_bytes())
    }

    pub fn rd8s(&mut self, addr: EveAddress, into: &mut [u8]) -> Result<(), T::Error> {
        self.with_cs(|spi| {
            spi.transmit(&addr.read_header())?;
            spi.receive(into)
        })
    }

    pub fn rd8(&mut self, addr: EveAddress) -> Result<u8, T::Error> {
        let mut data: [u8; 1] = [0; 1];
        self.rd8s(addr, &mut data)?;
        Ok(data[0])
    }

    pub fn rd16(&mut self, addr: EveAddress) -> Result<u16, T::Error> {
        let mut data: [u8; 2] = [0; 2];
        self.rd8s(addr, &mut data)?;
        Ok(u16::from_le_bytes(data))
    }

    pub fn rd32(&mut self, addr: EveAddress) -> Result<u32, T::Error> {
        let mut data: [u8; 4] = [0; 4];
        self.rd8s(addr, &mut data)?;
        Ok(u32::from_le_bytes(data))
    }

    /// Reads the four bytes of chip identification data from ROM.
    pub fn read_chip_id(&mut self) -> Result<[u8; 4], T::Error> {
        let mut data: [u8; 4] = [0; 4];
        self.rd8s(ROM_CHIPID, &mut data)?;
        Ok(data)
    }

    /// Busy-waits while polling `REG_ID` until it reports that the boot
    /// process is complete, returning `true` once it does.
    ///
    /// Returns `false` if the chip still hasn't booted after `poll_limit`
    /// attempts, which usually means it isn't connected correctly.
    pub fn poll_for_boot(&mut self, poll_limit: u32) -> Result<bool, T::Error> {
        for _ in 0..poll_limit {
            if self.rd8(REG_ID)? == REG_ID_VALUE {
                return Ok(true);
            }
        }
        #[cfg(feature = "log")]
        log::warn!("EVE did not boot after {} polls", poll_limit);
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::{RAM_G, REG_CMDB_WRITE};
    use crate::burst::BurstTransfer;
    use crate::error::BurstError;
    use crate::signal::BurstSignal;
    use crate::testing::{CsEvent, MockChipSelect, MockSpi, MockSpiError};

    #[test]
    fn test_host_command() {
        let mut host = Host::new(MockSpi::new(), MockChipSelect::new());
        host.host_command(HostCmd::CLKEXT, 0).unwrap();
        host.host_command(HostCmd::ACTIVE, 0).unwrap();
        let (spi, cs) = host.release();
        assert_eq!(spi.sent, vec![0x44, 0x00, 0x00, 0x00, 0x00, 0x00]);
        assert_eq!(
            cs.events(),
            vec![
                CsEvent::Select,
                CsEvent::Unselect,
                CsEvent::Select,
                CsEvent::Unselect
            ]
        );
    }

    #[test]
    fn test_writes_little_endian() {
        let mut host = Host::new(MockSpi::new(), MockChipSelect::new());
        host.wr32(RAM_G + 4, 0x11223344).unwrap();
        host.wr16(RAM_G, 0xAABB).unwrap();
        let (spi, _) = host.release();
        assert_eq!(
            spi.sent,
            vec![0x80, 0x00, 0x04, 0x44, 0x33, 0x22, 0x11, 0x80, 0x00, 0x00, 0xBB, 0xAA]
        );
    }

    #[test]
    fn test_reads_little_endian() {
        // Four header bytes clock in junk before the data arrives.
        let spi = MockSpi::with_replies(&[0, 0, 0, 0, 0x78, 0x56, 0x34, 0x12]);
        let mut host = Host::new(spi, MockChipSelect::new());
        assert_eq!(host.rd32(REG_CMDB_WRITE).unwrap(), 0x12345678);
        let (spi, cs) = host.release();
        assert_eq!(spi.sent, vec![0x30, 0x25, 0x78, 0x00, 0, 0, 0, 0]);
        assert!(!cs.is_selected());
    }

    #[test]
    fn test_poll_for_boot() {
        let spi = MockSpi::with_replies(&[0, 0, 0, 0, 0x00, 0, 0, 0, 0, 0x7c]);
        let mut host = Host::new(spi, MockChipSelect::new());
        assert_eq!(host.poll_for_boot(5), Ok(true));

        let mut host = Host::new(MockSpi::new(), MockChipSelect::new());
        assert_eq!(host.poll_for_boot(3), Ok(false));
    }

    #[test]
    fn test_error_releases_cs() {
        let mut host = Host::new(MockSpi::failing_after(2), MockChipSelect::new());
        assert_eq!(host.wr8(RAM_G, 1), Err(MockSpiError));
        let (_, cs) = host.release();
        assert_eq!(cs.events(), vec![CsEvent::Select, CsEvent::Unselect]);
    }

    #[test]
    fn test_borrowed_burst() {
        let mut host = Host::new(MockSpi::new(), MockChipSelect::new());
        {
            let mut burst = host.burst();
            burst.begin_burst_to(REG_CMDB_WRITE).unwrap();
            burst.write_word(0xffffff00).unwrap();
            burst.end_burst().unwrap();
        }
        host.wr8(RAM_G, 0x5a).unwrap();
        let (spi, _) = host.release();
        assert_eq!(
            spi.sent,
            vec![0xb0, 0x25, 0x78, 0x00, 0xff, 0xff, 0xff, 0x80, 0x00, 0x00, 0x5a]
        );
    }

    #[test]
    fn test_abandoned_burst_releases_cs() {
        let mut host = Host::new(MockSpi::new(), MockChipSelect::new());
        {
            let mut burst = host.burst();
            burst.begin_burst_to(REG_CMDB_WRITE).unwrap();
            burst.write_word(0xffffff00).unwrap();
        }
        host.wr8(RAM_G, 0x5a).unwrap();
        let (_, cs) = host.release();
        assert_eq!(
            cs.events(),
            vec![
                CsEvent::Select,
                CsEvent::Unselect,
                CsEvent::Select,
                CsEvent::Unselect
            ]
        );
    }

    #[test]
    fn test_failed_burst_header_releases_cs() {
        let mut host = Host::new(MockSpi::failing_after(1), MockChipSelect::new());
        assert_eq!(
            host.burst().begin_burst_to(REG_CMDB_WRITE),
            Err(BurstError::Transport(MockSpiError))
        );
        assert_eq!(host.wr8(RAM_G, 1), Err(MockSpiError));
        let (_, cs) = host.release();
        assert_eq!(
            cs.events(),
            vec![
                CsEvent::Select,
                CsEvent::Unselect,
                CsEvent::Select,
                CsEvent::Unselect
            ]
        );
    }

    #[test]
    fn test_shares_burst_signal_chip_select() {
        let signal = BurstSignal::new(MockChipSelect::new());
        let mut host = Host::new(MockSpi::new(), signal.chip_select());
        host.wr8(RAM_G, 1).unwrap();
        assert_eq!(
            signal.inspect_cs(|cs| cs.events()),
            vec![CsEvent::Select, CsEvent::Unselect]
        );
    }
}
