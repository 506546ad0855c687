//! Interrupt-context event latching
//!
//! # Design
//! The interrupt handler and the foreground driver share nothing but an [InterruptFlags] block.
//! The handler only sees it through an [InterruptHandle], which can latch events and bump counters
//! but never reach the MAC configuration, the rings, or the link state. Latched events are only
//! ever cleared by the foreground.
use core::sync::atomic::{AtomicBool, AtomicU32, AtomicU8, Ordering};

use crate::LinkEvent;

/// Events reported by the peripheral in one interrupt.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Interrupts {
    /// The link-monitor input rose.
    pub link_up: bool,
    /// The link-monitor input fell.
    pub link_down: bool,
    /// A magic packet was detected.
    pub magic_packet: bool,
    /// A frame was received.
    pub receive: bool,
    /// A frame was transmitted.
    pub transmit: bool,
    /// The receive DMA found no free descriptor and suspended.
    pub receive_unavailable: bool,
}

/// The interrupt status registers of the peripheral.
pub trait InterruptSource {
    /// Read and acknowledge every pending interrupt cause.
    fn acknowledge(&mut self) -> Interrupts;
}

/// State shared between the interrupt handler and the driver.
pub struct InterruptFlags {
    link_event: AtomicU8,
    magic_packet: AtomicBool,
    rx_interrupts: AtomicU32,
    tx_interrupts: AtomicU32,
    rx_unavailable: AtomicU32,
}

impl InterruptFlags {
    pub const fn new() -> Self {
        Self {
            link_event: AtomicU8::new(0),
            magic_packet: AtomicBool::new(false),
            rx_interrupts: AtomicU32::new(0),
            tx_interrupts: AtomicU32::new(0),
            rx_unavailable: AtomicU32::new(0),
        }
    }

    /// The view of these flags the interrupt handler is permitted to use.
    pub fn handle(&self) -> InterruptHandle<'_> {
        InterruptHandle { flags: self }
    }

    /// Consume the latched link transition, if any.
    pub(crate) fn take_link_event(&self) -> LinkEvent {
        LinkEvent::from(self.link_event.swap(LinkEvent::None.into(), Ordering::AcqRel))
    }

    /// Consume the latched magic packet detection, if any.
    pub(crate) fn take_magic_packet(&self) -> bool {
        self.magic_packet.swap(false, Ordering::AcqRel)
    }

    /// Drop all latched events.
    pub(crate) fn clear(&self) {
        self.link_event.store(LinkEvent::None.into(), Ordering::Release);
        self.magic_packet.store(false, Ordering::Release);
    }

    pub(crate) fn reset_counters(&self) {
        self.rx_interrupts.store(0, Ordering::Relaxed);
        self.tx_interrupts.store(0, Ordering::Relaxed);
        self.rx_unavailable.store(0, Ordering::Relaxed);
    }

    pub(crate) fn rx_interrupts(&self) -> u32 {
        self.rx_interrupts.load(Ordering::Relaxed)
    }

    pub(crate) fn tx_interrupts(&self) -> u32 {
        self.tx_interrupts.load(Ordering::Relaxed)
    }

    pub(crate) fn rx_unavailable(&self) -> u32 {
        self.rx_unavailable.load(Ordering::Relaxed)
    }
}

impl Default for InterruptFlags {
    fn default() -> Self {
        Self::new()
    }
}

/// The interrupt context's restricted view of [InterruptFlags].
#[derive(Copy, Clone)]
pub struct InterruptHandle<'a> {
    flags: &'a InterruptFlags,
}

impl<'a> InterruptHandle<'a> {
    /// Acknowledge the peripheral's pending interrupts and latch what happened.
    ///
    /// # Note
    /// This is the whole body of the Ethernet interrupt handler. It never blocks and never touches
    /// the MAC configuration. Only one link transition is stored, so a later one overwrites an
    /// earlier one that has not been serviced yet.
    pub fn on_interrupt(&self, source: &mut impl InterruptSource) {
        let interrupts = source.acknowledge();

        // When both edges are seen at once, the order is unknown. The foreground re-reads the
        // level anyway.
        if interrupts.link_down {
            self.latch_link_event(LinkEvent::Down);
        }
        if interrupts.link_up {
            self.latch_link_event(LinkEvent::Up);
        }

        if interrupts.magic_packet {
            self.latch_magic_packet();
        }

        if interrupts.receive {
            self.flags.rx_interrupts.fetch_add(1, Ordering::Relaxed);
        }
        if interrupts.transmit {
            self.flags.tx_interrupts.fetch_add(1, Ordering::Relaxed);
        }
        if interrupts.receive_unavailable {
            self.flags.rx_unavailable.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Latch a link transition directly.
    pub fn latch_link_event(&self, event: LinkEvent) {
        self.flags.link_event.store(event.into(), Ordering::Release);
    }

    /// Latch a magic packet detection directly.
    pub fn latch_magic_packet(&self) {
        self.flags.magic_packet.store(true, Ordering::Release);
    }
}
