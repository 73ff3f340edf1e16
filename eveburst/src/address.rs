//! Addresses in the EVE memory map and the SPI message headers that
//! select them.

use core::convert::TryFrom;

/// `EveAddress` represents a memory address in the memory map of an
/// EVE controller chip.
///
/// An `EveAddress` value is guaranteed to always be in the valid address
/// range for EVE controllers, which is a 22-bit address space and thus
/// the remaining high-order bits will always be zero.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EveAddress(u32);

impl EveAddress {
    // Mask representing the bits of a u32 that contribute to an EveAddress.
    pub const MASK: u32 = 0x003fffff;

    /// Length of the header that begins a memory write transaction.
    pub const WRITE_HEADER_LEN: usize = 3;

    /// Length of the header that begins a memory read transaction,
    /// including the dummy byte.
    pub const READ_HEADER_LEN: usize = 4;

    /// Check whether the given raw address is within the expected
    /// range for a memory address, returning `true` only if so.
    pub const fn is_valid(raw: u32) -> bool {
        // Only the lowest 22 bits may be nonzero.
        (raw >> 22) == 0
    }

    /// Turns the given raw address value into a valid `EveAddress` by masking
    /// out the bits that must always be zero for a valid address.
    ///
    /// This is intended for initializing constants representing well-known
    /// addresses in the memory map. For dynamically-derived address values
    /// use the `TryFrom<u32>` implementation to get an error if the value
    /// is out of range.
    pub const fn force_raw(raw: u32) -> Self {
        Self(raw & Self::MASK)
    }

    pub const fn to_raw(self) -> u32 {
        self.0
    }

    /// Returns the address `offset` bytes after this one, wrapping within
    /// the 22-bit address space.
    pub const fn offset(self, offset: u32) -> Self {
        Self::force_raw(self.0.wrapping_add(offset))
    }

    /// Write the three bytes needed to form a "write memory" header
    /// for the address into the given bytes.
    ///
    /// The same header begins a command burst, where the address is
    /// `REG_CMDB_WRITE` and everything after the header is command words.
    pub fn build_write_header(self, into: &mut [u8; 3]) {
        into[0] = (((self.0 >> 16) & 0b00111111) | 0b10000000) as u8;
        into[1] = (self.0 >> 8) as u8;
        into[2] = self.0 as u8;
    }

    /// Write the four bytes needed to form a "read memory" header
    /// for the address into the given bytes.
    pub fn build_read_header(self, into: &mut [u8; 4]) {
        into[0] = ((self.0 >> 16) & 0b00111111) as u8;
        into[1] = (self.0 >> 8) as u8;
        into[2] = self.0 as u8;
        into[3] = 0; // "dummy byte", per the datasheet
    }

    pub fn write_header(self) -> [u8; 3] {
        let mut header = [0; 3];
        self.build_write_header(&mut header);
        header
    }

    pub fn read_header(self) -> [u8; 4] {
        let mut header = [0; 4];
        self.build_read_header(&mut header);
        header
    }
}

/// `EveAddress` can be converted from a `u32` as long as the value is
/// within the 22-bit address space.
impl TryFrom<u32> for EveAddress {
    type Error = ();

    fn try_from(raw: u32) -> Result<Self, Self::Error> {
        if Self::is_valid(raw) {
            Ok(Self(raw))
        } else {
            Err(())
        }
    }
}

/// Arithmetic with `EveAddress` is 22-bit modular arithmetic, thus ensuring
/// that the result is still always in the expected address range.
impl core::ops::Add<u32> for EveAddress {
    type Output = Self;

    fn add(self, offset: u32) -> Self {
        self.offset(offset)
    }
}

impl core::ops::AddAssign<u32> for EveAddress {
    fn add_assign(&mut self, offset: u32) {
        *self = self.offset(offset);
    }
}

impl From<EveAddress> for u32 {
    fn from(addr: EveAddress) -> u32 {
        addr.0
    }
}

// Memory map shared by FT81x and BT81x.
pub const RAM_G: EveAddress = EveAddress::force_raw(0x000000);
pub const RAM_G_LEN: u32 = 1024 << 10;
pub const ROM_CHIPID: EveAddress = EveAddress::force_raw(0x0c0000);
pub const RAM_DL: EveAddress = EveAddress::force_raw(0x300000);
pub const RAM_DL_LEN: u32 = 8 << 10;
pub const RAM_REG: EveAddress = EveAddress::force_raw(0x302000);
pub const RAM_CMD: EveAddress = EveAddress::force_raw(0x308000);
pub const RAM_CMD_LEN: u32 = 4 << 10;

pub const REG_ID: EveAddress = RAM_REG.offset(0x000);
pub const REG_CPURESET: EveAddress = RAM_REG.offset(0x020);
pub const REG_CMD_READ: EveAddress = RAM_REG.offset(0x0f8);
pub const REG_CMD_WRITE: EveAddress = RAM_REG.offset(0x0fc);
pub const REG_CMD_DL: EveAddress = RAM_REG.offset(0x100);
pub const REG_CMDB_SPACE: EveAddress = RAM_REG.offset(0x574);
pub const REG_CMDB_WRITE: EveAddress = RAM_REG.offset(0x578);

/// The value `REG_ID` holds once the chip has finished booting.
pub const REG_ID_VALUE: u8 = 0x7c;
