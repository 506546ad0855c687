//! Auto-negotiation result decoding
//!
//! Both link partners advertise an IEEE 802.3 technology-ability field. The highest common
//! speed/duplex mode wins, and the pause bits of both sides resolve into a flow-control policy
//! through Table 28B-3 of Annex 28B.
use bit_field::BitField;

use crate::SpeedDuplex;

/// The technology-ability field of a base page (bits A0..A6).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct TechnologyAbility(pub u8);

impl TechnologyAbility {
    pub const HALF_10: u8 = 1 << 0;
    pub const FULL_10: u8 = 1 << 1;
    pub const HALF_100: u8 = 1 << 2;
    pub const FULL_100: u8 = 1 << 3;
    pub const T4_100: u8 = 1 << 4;
    pub const PAUSE: u8 = 1 << 5;
    pub const ASYMMETRIC_PAUSE: u8 = 1 << 6;

    /// The pause ability as the 2-bit `PAUSE:ASM_DIR` value used for resolution.
    pub fn pause_ability(&self) -> u8 {
        (self.0.get_bit(5) as u8) << 1 | self.0.get_bit(6) as u8
    }

    fn supports(&self, mode: u8) -> bool {
        self.0 & mode == mode
    }
}

/// The flow-control directions the MAC should honor.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct PauseResolution {
    /// Send pause frames when the receive FIFO fills up.
    pub transmit: bool,
    /// Stop transmitting on receipt of a pause frame.
    pub receive: bool,
}

impl PauseResolution {
    const DISABLED: Self = Self {
        transmit: false,
        receive: false,
    };
}

struct Resolution {
    mask: u8,
    value: u8,
    result: PauseResolution,
}

impl Resolution {
    const fn new(mask: u8, value: u8, transmit: bool, receive: bool) -> Self {
        Self {
            mask,
            value,
            result: PauseResolution { transmit, receive },
        }
    }
}

/// IEEE 802.3 Annex 28B, Table 28B-3, keyed by `local PAUSE, local ASM_DIR, partner PAUSE,
/// partner ASM_DIR` from the most significant bit down. The first matching row wins.
const PAUSE_RESOLUTION: [Resolution; 8] = [
    Resolution::new(0xC, 0x0, false, false),
    Resolution::new(0xE, 0x4, false, false),
    Resolution::new(0xF, 0x6, false, false),
    Resolution::new(0xF, 0x7, true, false),
    Resolution::new(0xE, 0x8, false, false),
    Resolution::new(0xA, 0xA, true, true),
    Resolution::new(0xF, 0xC, false, false),
    Resolution::new(0xF, 0xD, false, true),
];

/// Resolve the pause policy from both sides' pause abilities.
///
/// # Args
/// * `local` - The local 2-bit `PAUSE:ASM_DIR` ability.
/// * `partner` - The link partner's 2-bit `PAUSE:ASM_DIR` ability.
///
/// # Returns
/// The flow-control directions to enable. Keys matching no table row disable pause in both
/// directions.
pub fn resolve_pause(local: u8, partner: u8) -> PauseResolution {
    let key = (local & 0b11) << 2 | (partner & 0b11);

    PAUSE_RESOLUTION
        .iter()
        .find(|row| key & row.mask == row.value)
        .map(|row| row.result)
        .unwrap_or(PauseResolution::DISABLED)
}

/// Determine the highest-priority mode both link partners advertise.
pub fn decode_speed_duplex(local: TechnologyAbility, partner: TechnologyAbility) -> SpeedDuplex {
    let shared = TechnologyAbility(local.0 & partner.0);

    [
        (TechnologyAbility::FULL_100, SpeedDuplex::Full100),
        (TechnologyAbility::HALF_100, SpeedDuplex::Half100),
        (TechnologyAbility::FULL_10, SpeedDuplex::Full10),
        (TechnologyAbility::HALF_10, SpeedDuplex::Half10),
    ]
    .iter()
    .find(|(mode, _)| shared.supports(*mode))
    .map(|(_, speed)| *speed)
    .unwrap_or(SpeedDuplex::NoLink)
}
