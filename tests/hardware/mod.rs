use minimac::{
    Endianness, InterruptSource, Interrupts, MacRegisters, Phy, Platform, SpeedDuplex,
    TechnologyAbility,
};
use std::cell::RefCell;

/// Everything the simulated board exposes, shared between the mock peripherals and the test.
#[derive(Default, Debug)]
pub struct Hardware {
    pub link_level: bool,
    pub drop_link_on_arm: bool,
    pub pending: Interrupts,

    pub mac_resets: usize,
    pub address: (u32, u32),
    pub speed_duplex: Option<SpeedDuplex>,
    pub flow_control: (bool, bool),
    pub enables: (bool, bool),
    pub magic_packet_detection: bool,
    pub rx_dma_starts: usize,
    pub tx_dma_starts: usize,
    pub tx_dma_running: bool,

    pub phy_resets: usize,
    pub phy_fails: bool,
    pub advertised_pause: Option<bool>,
    pub local: u8,
    pub partner: u8,

    pub bound_priority: Option<u8>,
}

impl Hardware {
    /// Make the PHY report a completed negotiation and raise the link.
    pub fn negotiate(&mut self, local: u8, partner: u8) {
        self.local = local;
        self.partner = partner;
        self.link_level = true;
        self.pending.link_up = true;
    }

    pub fn drop_link(&mut self) {
        self.link_level = false;
        self.pending.link_down = true;
    }
}

pub struct Registers<'a> {
    pub hardware: &'a RefCell<Hardware>,
}

impl<'a> MacRegisters for Registers<'a> {
    fn reset(&mut self) {
        let mut hardware = self.hardware.borrow_mut();
        hardware.mac_resets += 1;
        hardware.enables = (false, false);
        hardware.magic_packet_detection = false;
        hardware.tx_dma_running = false;
    }

    fn set_address(&mut self, low: u32, high: u32) {
        self.hardware.borrow_mut().address = (low, high);
    }

    fn set_ring_bases(&mut self, _rx: u32, _tx: u32) {}

    fn set_max_frame_length(&mut self, length: u16) {
        assert_eq!(length, 1518);
    }

    fn set_store_and_forward(&mut self, _enabled: bool) {}

    fn set_receive_continuation(&mut self, _enabled: bool) {}

    fn set_endianness(&mut self, _endianness: Endianness) {}

    fn set_speed_duplex(&mut self, speed_duplex: SpeedDuplex) {
        self.hardware.borrow_mut().speed_duplex.replace(speed_duplex);
    }

    fn set_flow_control(&mut self, transmit: bool, receive: bool) {
        self.hardware.borrow_mut().flow_control = (transmit, receive);
    }

    fn set_enables(&mut self, rx: bool, tx: bool) {
        self.hardware.borrow_mut().enables = (rx, tx);
    }

    fn set_magic_packet_detection(&mut self, enabled: bool) {
        let mut hardware = self.hardware.borrow_mut();
        hardware.magic_packet_detection = enabled;
        if enabled && hardware.drop_link_on_arm {
            hardware.link_level = false;
        }
    }

    fn link_monitor_level(&self) -> bool {
        self.hardware.borrow().link_level
    }

    fn rx_dma_running(&self) -> bool {
        true
    }

    fn tx_dma_running(&self) -> bool {
        self.hardware.borrow().tx_dma_running
    }

    fn start_rx_dma(&mut self) {
        self.hardware.borrow_mut().rx_dma_starts += 1;
    }

    fn start_tx_dma(&mut self) {
        let mut hardware = self.hardware.borrow_mut();
        hardware.tx_dma_starts += 1;
        hardware.tx_dma_running = true;
    }

    fn set_interrupts_enabled(&mut self, _enabled: bool) {}
}

pub struct Transceiver<'a> {
    pub hardware: &'a RefCell<Hardware>,
}

impl<'a> Phy for Transceiver<'a> {
    fn reset(&mut self) -> bool {
        let mut hardware = self.hardware.borrow_mut();
        hardware.phy_resets += 1;
        !hardware.phy_fails
    }

    fn start_autonegotiate(&mut self, pause: bool) {
        self.hardware.borrow_mut().advertised_pause.replace(pause);
    }

    fn negotiation_result(&mut self) -> (TechnologyAbility, TechnologyAbility) {
        let hardware = self.hardware.borrow();
        (
            TechnologyAbility(hardware.local),
            TechnologyAbility(hardware.partner),
        )
    }

    fn link_level(&mut self) -> bool {
        self.hardware.borrow().link_level
    }
}

pub struct Board<'a> {
    pub hardware: &'a RefCell<Hardware>,
}

impl<'a> Platform for Board<'a> {
    fn enable_peripheral_clock(&mut self) {}

    fn configure_pins(&mut self) {}

    fn bind_interrupt(&mut self, _handler: fn(), priority: u8) {
        self.hardware.borrow_mut().bound_priority.replace(priority);
    }

    fn disable_interrupt(&mut self) {
        self.hardware.borrow_mut().bound_priority = None;
    }
}

/// The interrupt status registers, acknowledged on read.
pub struct Status<'a> {
    pub hardware: &'a RefCell<Hardware>,
}

impl<'a> InterruptSource for Status<'a> {
    fn acknowledge(&mut self) -> Interrupts {
        core::mem::take(&mut self.hardware.borrow_mut().pending)
    }
}
