use core::str::FromStr;

use num_enum::{FromPrimitive, IntoPrimitive};
use serde::Serialize;

/// A 48-bit station address.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MacAddress(pub [u8; 6]);

impl MacAddress {
    /// Split the address into the low 32-bit and high 16-bit register halves.
    ///
    /// # Note
    /// Byte 0 of the address is transmitted first and lands in the least significant byte of the
    /// low half.
    pub fn halves(&self) -> (u32, u32) {
        let [a, b, c, d, e, f] = self.0;
        (
            u32::from_le_bytes([a, b, c, d]),
            u32::from(u16::from_le_bytes([e, f])),
        )
    }

    /// Determine if this is a group (multicast or broadcast) address.
    pub fn is_multicast(&self) -> bool {
        self.0[0] & 0x01 != 0
    }
}

impl core::fmt::Display for MacAddress {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            a, b, c, d, e, g
        )
    }
}

/// The address could not be parsed from its `xx:xx:xx:xx:xx:xx` notation.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct AddressParseError;

impl FromStr for MacAddress {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut octets = [0u8; 6];
        let mut parts = s.split(|c| c == ':' || c == '-');

        for octet in octets.iter_mut() {
            let part = parts.next().ok_or(AddressParseError)?;
            // `from_str_radix` alone would also take a sign.
            if part.len() != 2 || !part.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(AddressParseError);
            }
            *octet = u8::from_str_radix(part, 16).map_err(|_| AddressParseError)?;
        }

        if parts.next().is_some() {
            return Err(AddressParseError);
        }

        Ok(MacAddress(octets))
    }
}

/// The speed and duplex both link partners agreed on.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub enum SpeedDuplex {
    NoLink,
    Half10,
    Full10,
    Half100,
    Full100,
}

impl SpeedDuplex {
    pub fn is_full_duplex(&self) -> bool {
        matches!(self, SpeedDuplex::Full10 | SpeedDuplex::Full100)
    }

    pub fn is_100mbps(&self) -> bool {
        matches!(self, SpeedDuplex::Half100 | SpeedDuplex::Full100)
    }
}

impl Default for SpeedDuplex {
    fn default() -> Self {
        SpeedDuplex::NoLink
    }
}

/// Byte ordering used by the DMA engine for descriptors and frame data.
#[derive(Copy, Clone, Debug, PartialEq, Eq, IntoPrimitive)]
#[repr(u8)]
pub enum Endianness {
    Little = 0,
    Big = 1,
}

/// A link transition latched by the interrupt handler.
///
/// # Note
/// This is only a hint. The link-monitor level read when the event is consumed decides what the
/// link actually did.
#[derive(Copy, Clone, Debug, PartialEq, Eq, FromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum LinkEvent {
    #[num_enum(default)]
    None = 0,
    Up = 1,
    Down = 2,
}
