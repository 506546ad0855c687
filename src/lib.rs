#![cfg_attr(not(test), no_std)]
//! # Minimac
//!
//! A minimal Ethernet MAC/DMA driver for `no_std` microcontrollers.
//!
//! # Design
//! The driver owns a receive and a transmit descriptor ring, each slot bound for life to one
//! 32-byte aligned frame buffer. Ownership of a slot flips between the DMA engine and software
//! through the descriptor OWN bit, which is the only synchronization primitive between the two.
//!
//! Interrupts never touch the MAC configuration. The interrupt handler only latches which events
//! occurred into an [InterruptFlags] block through an [InterruptHandle]. Foreground code calls
//! [Ethernet::service] periodically, which consumes those events, confirms them against the
//! link-monitor level and drives the link state machine.
//!
//! Hardware access is abstracted behind the [MacRegisters], [Phy], [Platform] and
//! [InterruptSource] traits.
//!
//! # Example
//! ```ignore
//! static FLAGS: InterruptFlags = InterruptFlags::new();
//! #[link_section = ".eth_ram"]
//! static mut RING: DesRing<4, 4> = DesRing::new();
//!
//! let config = Config::new(Hertz(96_000_000)).pause_frames(true).interrupt(on_ethernet, 3);
//! let mut eth = Ethernet::new(config, registers, phy, board, unsafe { &mut RING }, &FLAGS);
//! eth.open("02:00:00:00:00:01".parse().unwrap())?;
//!
//! loop {
//!     if eth.service() {
//!         // Link came up, start the protocol stack.
//!     }
//!     let len = eth.read(&mut frame);
//! }
//! ```
pub mod arena;
pub mod config;
mod descriptor;
mod ethernet;
pub mod interrupt;
mod link;
pub mod mac;
#[cfg(test)]
mod mock;
pub mod negotiation;
pub mod phy;
pub mod platform;
pub mod ring;
pub mod statistics;
pub mod types;

pub use arena::{Buffer, BufferArena, BUFFER_SIZE};
pub use config::Config;
pub use descriptor::{RxError, TxError};
pub use embedded_time;
pub use ethernet::Ethernet;
pub use interrupt::{InterruptFlags, InterruptHandle, InterruptSource, Interrupts};
pub use link::LinkState;
pub use mac::{Mac, MacRegisters};
pub use negotiation::{decode_speed_duplex, resolve_pause, PauseResolution, TechnologyAbility};
pub use phy::Phy;
pub use platform::Platform;
pub use ring::DesRing;
pub use statistics::Statistics;
pub use types::{Endianness, LinkEvent, MacAddress, SpeedDuplex};

use num_enum::IntoPrimitive;

#[cfg(feature = "logging")]
pub(crate) use log::{debug, error, info, trace, warn};

/// Maximum payload carried by one frame.
pub const MTU: usize = 1500;

/// Length of the Ethernet II header (destination, source, ethertype).
pub const HEADER_LENGTH: usize = 14;

/// Length of the frame check sequence appended by the MAC.
pub const CRC_LENGTH: usize = 4;

/// Largest frame the MAC accepts, including header and CRC.
pub const MAX_FRAME_LENGTH: usize = MTU + HEADER_LENGTH + CRC_LENGTH;

/// Possible errors encountered while operating the driver.
///
/// # Note
/// Every variant carries a stable numeric code, available through `u8::from(error)`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, IntoPrimitive)]
#[repr(u8)]
pub enum Error {
    /// The PHY did not come out of reset. The whole `open()` must be retried.
    PhyInit = 1,

    /// No link is established, so no frame can be transmitted.
    LinkDown = 2,

    /// The MAC is waiting for a magic packet and has its transmitter disabled.
    MagicPacketMode = 3,

    /// Every transmit descriptor is still owned by the DMA engine.
    BufferFull = 4,

    /// The frame does not fit in a transmit buffer.
    FrameTooLarge = 5,

    /// Switching the MAC into magic-packet detection dropped the link.
    LinkLostDuringArm = 6,
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Error::PhyInit => "PHY failed to initialize",
                Error::LinkDown => "Link is down",
                Error::MagicPacketMode => "Waiting for a magic packet",
                Error::BufferFull => "No transmit descriptor available",
                Error::FrameTooLarge => "Frame exceeds the buffer capacity",
                Error::LinkLostDuringArm => "Link lost while arming Wake-on-LAN",
            }
        )
    }
}

#[cfg(not(feature = "logging"))]
mod mac_log {
    macro_rules! trace {
        ($($arg:expr),* $(,)?) => {{ $( let _ = &$arg; )* }};
    }

    macro_rules! debug {
        ($($arg:expr),* $(,)?) => {{ $( let _ = &$arg; )* }};
    }

    macro_rules! info {
        ($($arg:expr),* $(,)?) => {{ $( let _ = &$arg; )* }};
    }

    macro_rules! warn_ {
        ($($arg:expr),* $(,)?) => {{ $( let _ = &$arg; )* }};
    }

    macro_rules! error {
        ($($arg:expr),* $(,)?) => {{ $( let _ = &$arg; )* }};
    }

    pub(crate) use {debug, error, info, trace, warn_ as warn};
}

#[cfg(not(feature = "logging"))]
pub(crate) use mac_log::{debug, error, info, trace, warn};
