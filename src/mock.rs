//! Simulated hardware for unit tests.
use crate::{
    interrupt::{InterruptSource, Interrupts},
    mac::MacRegisters,
    negotiation::TechnologyAbility,
    phy::Phy,
    platform::Platform,
    ring::{DesRing, Dma},
    Endianness, RxError, SpeedDuplex, TxError,
};

/// A register block that records what was programmed.
#[derive(Default)]
pub struct Registers {
    pub resets: usize,
    pub address: (u32, u32),
    pub ring_bases: (u32, u32),
    pub max_frame_length: u16,
    pub store_and_forward: bool,
    pub receive_continuation: bool,
    pub endianness: Option<Endianness>,
    pub speed_duplex: SpeedDuplex,
    pub flow_control: (bool, bool),
    pub enables: (bool, bool),
    /// Every value written to the enables, in order.
    pub enable_history: Vec<(bool, bool)>,
    pub magic_packet_detection: bool,
    pub interrupts_enabled: bool,
    pub link_level: bool,
    /// Drop the link level as soon as magic packet detection is armed.
    pub drop_link_on_arm: bool,
    pub dma: DmaEngine,
    pub rx_starts: usize,
}

impl MacRegisters for Registers {
    fn reset(&mut self) {
        let link_level = self.link_level;
        let drop_link_on_arm = self.drop_link_on_arm;
        let resets = self.resets;
        *self = Registers {
            resets: resets + 1,
            link_level,
            drop_link_on_arm,
            ..Default::default()
        };
    }

    fn set_address(&mut self, low: u32, high: u32) {
        self.address = (low, high);
    }

    fn set_ring_bases(&mut self, rx: u32, tx: u32) {
        self.ring_bases = (rx, tx);
    }

    fn set_max_frame_length(&mut self, length: u16) {
        self.max_frame_length = length;
    }

    fn set_store_and_forward(&mut self, enabled: bool) {
        self.store_and_forward = enabled;
    }

    fn set_receive_continuation(&mut self, enabled: bool) {
        self.receive_continuation = enabled;
    }

    fn set_endianness(&mut self, endianness: Endianness) {
        self.endianness.replace(endianness);
    }

    fn set_speed_duplex(&mut self, speed_duplex: SpeedDuplex) {
        self.speed_duplex = speed_duplex;
    }

    fn set_flow_control(&mut self, transmit: bool, receive: bool) {
        self.flow_control = (transmit, receive);
    }

    fn set_enables(&mut self, rx: bool, tx: bool) {
        self.enables = (rx, tx);
        self.enable_history.push((rx, tx));
    }

    fn set_magic_packet_detection(&mut self, enabled: bool) {
        self.magic_packet_detection = enabled;
        if enabled && self.drop_link_on_arm {
            self.link_level = false;
        }
    }

    fn link_monitor_level(&self) -> bool {
        self.link_level
    }

    fn rx_dma_running(&self) -> bool {
        self.dma.rx_running()
    }

    fn tx_dma_running(&self) -> bool {
        self.dma.tx_running()
    }

    fn start_rx_dma(&mut self) {
        self.rx_starts += 1;
        self.dma.resume_rx();
    }

    fn start_tx_dma(&mut self) {
        self.dma.resume_tx();
    }

    fn set_interrupts_enabled(&mut self, enabled: bool) {
        self.interrupts_enabled = enabled;
    }
}

/// The autonomous side of the DMA engine, walking the rings with its own cursors.
#[derive(Default)]
pub struct DmaEngine {
    rx_index: usize,
    tx_index: usize,
    rx_suspended: bool,
    tx_active: bool,
    pub rx_starts: usize,
    pub tx_starts: usize,
}

impl DmaEngine {
    /// Deliver a frame into the next receive descriptor.
    ///
    /// # Returns
    /// False if the frame was lost because the engine is suspended or the ring is full.
    pub fn receive<const RX: usize, const TX: usize>(
        &mut self,
        ring: &mut DesRing<RX, TX>,
        frame: &[u8],
        errors: &[RxError],
    ) -> bool {
        if self.rx_suspended || !ring.rx.descriptors[self.rx_index].is_hardware_owned() {
            self.rx_suspended = true;
            return false;
        }

        ring.rx_buffer_mut(self.rx_index)[..frame.len()].copy_from_slice(frame);
        ring.rx.descriptors[self.rx_index].complete_rx(frame.len(), true, errors);
        self.rx_index = (self.rx_index + 1) % RX;
        true
    }

    /// Send the next queued frame.
    pub fn transmit<const RX: usize, const TX: usize>(
        &mut self,
        ring: &mut DesRing<RX, TX>,
    ) -> Option<Vec<u8>> {
        self.complete_tx(ring, &[])
    }

    /// Fail the next queued frame with the given errors.
    pub fn fail_transmit<const RX: usize, const TX: usize>(
        &mut self,
        ring: &mut DesRing<RX, TX>,
        errors: &[TxError],
    ) -> Option<Vec<u8>> {
        self.complete_tx(ring, errors)
    }

    fn complete_tx<const RX: usize, const TX: usize>(
        &mut self,
        ring: &mut DesRing<RX, TX>,
        errors: &[TxError],
    ) -> Option<Vec<u8>> {
        if !self.tx_active || !ring.tx.descriptors[self.tx_index].is_hardware_owned() {
            self.tx_active = false;
            return None;
        }

        ring.tx.descriptors[self.tx_index].complete_tx(errors);
        let frame = ring.tx_frame(self.tx_index).to_vec();
        self.tx_index = (self.tx_index + 1) % TX;
        Some(frame)
    }
}

impl Dma for DmaEngine {
    fn rx_running(&self) -> bool {
        !self.rx_suspended
    }

    fn resume_rx(&mut self) {
        self.rx_starts += 1;
        self.rx_suspended = false;
    }

    fn tx_running(&self) -> bool {
        self.tx_active
    }

    fn resume_tx(&mut self) {
        self.tx_starts += 1;
        self.tx_active = true;
    }
}

#[derive(Default)]
pub struct Source {
    pub pending: Interrupts,
}

impl InterruptSource for Source {
    fn acknowledge(&mut self) -> Interrupts {
        core::mem::take(&mut self.pending)
    }
}

#[derive(Default)]
pub struct MockPhy {
    pub fail_reset: bool,
    pub resets: usize,
    pub advertised_pause: Option<bool>,
    pub local: u8,
    pub partner: u8,
    pub link: bool,
}

impl Phy for MockPhy {
    fn reset(&mut self) -> bool {
        self.resets += 1;
        !self.fail_reset
    }

    fn start_autonegotiate(&mut self, pause: bool) {
        self.advertised_pause.replace(pause);
    }

    fn negotiation_result(&mut self) -> (TechnologyAbility, TechnologyAbility) {
        (TechnologyAbility(self.local), TechnologyAbility(self.partner))
    }

    fn link_level(&mut self) -> bool {
        self.link
    }
}

#[derive(Default)]
pub struct Board {
    pub clock_enabled: bool,
    pub pins_configured: bool,
    pub bound: Option<u8>,
    pub disables: usize,
}

impl Platform for Board {
    fn enable_peripheral_clock(&mut self) {
        self.clock_enabled = true;
    }

    fn configure_pins(&mut self) {
        self.pins_configured = true;
    }

    fn bind_interrupt(&mut self, _handler: fn(), priority: u8) {
        self.bound.replace(priority);
    }

    fn disable_interrupt(&mut self) {
        self.bound = None;
        self.disables += 1;
    }
}
