//! Driver traffic and error counters
use serde::Serialize;

use crate::descriptor::ErrorFlags;
use crate::{RxError, SpeedDuplex, TxError};

/// Frame-level receive errors, one counter per hardware error flag.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RxErrorCounters {
    pub overflow: u32,
    pub alignment: u32,
    pub runt: u32,
    pub crc: u32,
    pub phy: u32,
    pub address_filter: u32,
}

impl RxErrorCounters {
    pub(crate) fn record(&mut self, flags: ErrorFlags) {
        let counters = [
            (RxError::Overflow, &mut self.overflow),
            (RxError::Alignment, &mut self.alignment),
            (RxError::Runt, &mut self.runt),
            (RxError::Crc, &mut self.crc),
            (RxError::Phy, &mut self.phy),
            (RxError::AddressFilter, &mut self.address_filter),
        ];

        for (error, counter) in counters {
            if flags.rx(error) {
                *counter = counter.wrapping_add(1);
            }
        }
    }

    /// The sum over all error kinds.
    pub fn total(&self) -> u32 {
        self.overflow
            .wrapping_add(self.alignment)
            .wrapping_add(self.runt)
            .wrapping_add(self.crc)
            .wrapping_add(self.phy)
            .wrapping_add(self.address_filter)
    }
}

/// Transmit errors reported back by the DMA engine in completed descriptors.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TxErrorCounters {
    pub underflow: u32,
    pub collision: u32,
    pub deferred: u32,
    pub crc: u32,
}

impl TxErrorCounters {
    pub(crate) fn record(&mut self, flags: ErrorFlags) {
        let counters = [
            (TxError::Underflow, &mut self.underflow),
            (TxError::Collision, &mut self.collision),
            (TxError::Deferred, &mut self.deferred),
            (TxError::Crc, &mut self.crc),
        ];

        for (error, counter) in counters {
            if flags.tx(error) {
                *counter = counter.wrapping_add(1);
            }
        }
    }

    /// The sum over all error kinds.
    pub fn total(&self) -> u32 {
        self.underflow
            .wrapping_add(self.collision)
            .wrapping_add(self.deferred)
            .wrapping_add(self.crc)
    }
}

/// A snapshot of the driver counters.
///
/// # Note
/// Counters wrap on overflow and are only cleared by `open()` or an explicit
/// `reset_statistics()`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Statistics {
    /// Frames handed to the caller.
    pub rx_requests: u32,
    /// Bytes handed to the caller.
    pub rx_bytes: u32,
    /// Frames submitted for transmission.
    pub tx_requests: u32,
    /// Bytes submitted for transmission.
    pub tx_bytes: u32,

    pub rx_errors: RxErrorCounters,
    pub tx_errors: TxErrorCounters,

    /// Received frames dropped for a missing segment marker or an impossible length.
    pub rx_length_errors: u32,
    /// Transmit requests rejected for exceeding the buffer capacity.
    pub tx_length_errors: u32,
    /// Transmit requests rejected because the ring was full.
    pub tx_busy: u32,
    /// Times the receive DMA was found idle and restarted.
    pub rx_restarts: u32,
    /// Times the PHY did not come out of reset during `open()`, including the restart after a
    /// magic packet.
    pub phy_init_failures: u32,

    /// Receive-complete interrupts.
    pub rx_interrupts: u32,
    /// Transmit-complete interrupts.
    pub tx_interrupts: u32,
    /// Receive-buffer-unavailable interrupts.
    pub rx_unavailable: u32,

    pub link_up: bool,
    pub speed_duplex: SpeedDuplex,
}

impl Statistics {
    pub(crate) fn record_rx(&mut self, length: usize) {
        self.rx_requests = self.rx_requests.wrapping_add(1);
        self.rx_bytes = self.rx_bytes.wrapping_add(length as u32);
    }

    pub(crate) fn record_tx(&mut self, length: usize) {
        self.tx_requests = self.tx_requests.wrapping_add(1);
        self.tx_bytes = self.tx_bytes.wrapping_add(length as u32);
    }

    pub(crate) fn bump(counter: &mut u32) {
        *counter = counter.wrapping_add(1);
    }
}
