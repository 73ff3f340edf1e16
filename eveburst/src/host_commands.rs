use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Represents a "host command".
///
/// Host commands are a low-level mechanism for controlling the basic
/// functionality of the EVE chip, such as the system clock. They are sent
/// as a single three-byte transaction outside of any command burst.
#[derive(Clone, Copy, PartialEq, Eq, Debug, IntoPrimitive, TryFromPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
#[allow(non_camel_case_types)]
pub enum HostCmd {
    ACTIVE = 0x00,
    STANDBY = 0x41,
    SLEEP = 0x42,
    PWRDOWN = 0x50,
    CLKEXT = 0x44,
    CLKINT = 0x48,
    CLKSEL = 0x61,
    RST_PULSE = 0x68,
    PINDRIVE = 0x70,
    PIN_PD_STATE = 0x71,
}

impl HostCmd {
    /// Write the three bytes of the host command message into the given
    /// bytes.
    ///
    /// In all EVE implementations up to the time of writing the second
    /// argument must always be zero. It is exposed only for
    /// forward-compatibility.
    pub fn build_message(self, a0: u8, a1: u8, into: &mut [u8; 3]) {
        into[0] = self.into();
        into[1] = a0;
        into[2] = a1;
    }
}
