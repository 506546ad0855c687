//! MAC and DMA engine configuration
//!
//! [Mac] is the only part of the driver that writes MAC or DMA registers. The register block
//! itself is reached through [MacRegisters], implemented once per MCU family.
use crate::{
    info, ring::Dma, trace, Endianness, MacAddress, SpeedDuplex, MAX_FRAME_LENGTH,
};

/// Register-level access to the MAC and its DMA engine.
pub trait MacRegisters {
    /// Pulse the software reset of the MAC and DMA engine.
    fn reset(&mut self);

    /// Program the station address as its low 32-bit and high 16-bit halves.
    fn set_address(&mut self, low: u32, high: u32);

    /// Install the bus addresses of the first receive and transmit descriptors.
    fn set_ring_bases(&mut self, rx: u32, tx: u32);

    fn set_max_frame_length(&mut self, length: u16);

    /// Only start transmitting or forwarding a frame once it is completely in the FIFO.
    fn set_store_and_forward(&mut self, enabled: bool);

    /// Keep receiving into successive descriptors without per-frame re-arming.
    fn set_receive_continuation(&mut self, enabled: bool);

    fn set_endianness(&mut self, endianness: Endianness);

    fn set_speed_duplex(&mut self, speed_duplex: SpeedDuplex);

    /// Enable sending pause frames (`transmit`) and honoring received ones (`receive`).
    fn set_flow_control(&mut self, transmit: bool, receive: bool);

    /// Enable the MAC receiver and transmitter.
    fn set_enables(&mut self, rx: bool, tx: bool);

    fn set_magic_packet_detection(&mut self, enabled: bool);

    /// The hardware-debounced level of the link-monitor input.
    fn link_monitor_level(&self) -> bool;

    fn rx_dma_running(&self) -> bool;

    fn tx_dma_running(&self) -> bool;

    /// Start or resume the receive DMA.
    fn start_rx_dma(&mut self);

    /// Start or resume the transmit DMA.
    fn start_tx_dma(&mut self);

    /// Unmask the link, magic packet and frame interrupts of the peripheral.
    fn set_interrupts_enabled(&mut self, enabled: bool);
}

/// The MAC and DMA engine.
pub struct Mac<R: MacRegisters> {
    pub(crate) regs: R,
    enables: (bool, bool),
}

impl<R: MacRegisters> Mac<R> {
    pub fn new(regs: R) -> Self {
        Self {
            regs,
            enables: (false, false),
        }
    }

    /// Reset the MAC and DMA engine.
    ///
    /// # Note
    /// No other register may be touched until the reset has settled, so this busy-waits for
    /// `settle_cycles` before returning.
    pub fn reset(&mut self, settle_cycles: u32) {
        self.regs.reset();
        self.enables = (false, false);

        for _ in 0..settle_cycles {
            core::hint::spin_loop();
        }
    }

    /// Program addressing, framing and DMA behavior, then start the receive DMA.
    ///
    /// # Args
    /// * `address` - The station address.
    /// * `bases` - The bus addresses of the first receive and transmit descriptors.
    /// * `endianness` - The byte order of descriptors and frame data.
    pub fn configure(&mut self, address: MacAddress, bases: (u32, u32), endianness: Endianness) {
        let (low, high) = address.halves();
        self.regs.set_address(low, high);
        self.regs.set_ring_bases(bases.0, bases.1);
        self.regs.set_max_frame_length(MAX_FRAME_LENGTH as u16);
        self.regs.set_store_and_forward(true);
        self.regs.set_receive_continuation(true);
        self.regs.set_endianness(endianness);
        self.regs.start_rx_dma();

        info!("MAC configured for {}", address);
    }

    /// Program the negotiated mode and the flow-control policy.
    ///
    /// # Note
    /// Pause frames only exist in full duplex. In half duplex flow control is always disabled,
    /// whatever the resolution says.
    pub fn configure_duplex_and_pause(
        &mut self,
        speed_duplex: SpeedDuplex,
        transmit_pause: bool,
        receive_pause: bool,
    ) {
        self.regs.set_speed_duplex(speed_duplex);

        if speed_duplex.is_full_duplex() {
            self.regs.set_flow_control(transmit_pause, receive_pause);
        } else {
            self.regs.set_flow_control(false, false);
        }
    }

    pub fn enable(&mut self, rx: bool, tx: bool) {
        self.enables = (rx, tx);
        self.regs.set_enables(rx, tx);
    }

    /// Switch to receive-only operation and arm magic packet detection.
    pub fn enter_magic_packet_mode(&mut self) {
        trace!("Entering magic packet mode");
        self.regs.set_enables(true, false);
        self.regs.set_magic_packet_detection(true);
    }

    /// Disarm magic packet detection and restore the enables set before entering the mode.
    pub fn leave_magic_packet_mode(&mut self) {
        self.regs.set_magic_packet_detection(false);
        self.regs.set_enables(self.enables.0, self.enables.1);
    }

    /// Disable the receiver and transmitter and disarm magic packet detection.
    pub fn shutdown(&mut self) {
        self.enable(false, false);
        self.regs.set_magic_packet_detection(false);
    }

    pub fn link_monitor_level(&self) -> bool {
        self.regs.link_monitor_level()
    }

    pub fn set_interrupts_enabled(&mut self, enabled: bool) {
        self.regs.set_interrupts_enabled(enabled);
    }

    /// Access the underlying register block.
    pub fn registers(&mut self) -> &mut R {
        &mut self.regs
    }
}

impl<R: MacRegisters> Dma for Mac<R> {
    fn rx_running(&self) -> bool {
        self.regs.rx_dma_running()
    }

    fn resume_rx(&mut self) {
        self.regs.start_rx_dma();
    }

    fn tx_running(&self) -> bool {
        self.regs.tx_dma_running()
    }

    fn resume_tx(&mut self) {
        self.regs.start_tx_dma();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::Registers;

    #[test]
    fn configure() {
        let mut mac = Mac::new(Registers::default());
        mac.reset(10);
        mac.configure(
            MacAddress([0x02, 0, 0, 0, 0, 0x01]),
            (0x3000_0000, 0x3000_0100),
            Endianness::Little,
        );

        let regs = mac.registers();
        assert_eq!(regs.resets, 1);
        assert_eq!(regs.address, (0x2, 0x100));
        assert_eq!(regs.ring_bases, (0x3000_0000, 0x3000_0100));
        assert_eq!(regs.max_frame_length, 1518);
        assert!(regs.store_and_forward);
        assert!(regs.receive_continuation);
        assert_eq!(regs.endianness, Some(Endianness::Little));
        assert_eq!(regs.rx_starts, 1);
        assert_eq!(regs.enables, (false, false));
    }

    #[test]
    fn half_duplex_disables_pause() {
        let mut mac = Mac::new(Registers::default());

        mac.configure_duplex_and_pause(SpeedDuplex::Full100, true, true);
        assert_eq!(mac.registers().speed_duplex, SpeedDuplex::Full100);
        assert_eq!(mac.registers().flow_control, (true, true));

        mac.configure_duplex_and_pause(SpeedDuplex::Half100, true, true);
        assert_eq!(mac.registers().flow_control, (false, false));

        mac.configure_duplex_and_pause(SpeedDuplex::Full10, false, true);
        assert_eq!(mac.registers().flow_control, (false, true));
    }

    #[test]
    fn magic_packet_mode() {
        let mut mac = Mac::new(Registers::default());
        mac.enable(true, true);

        mac.enter_magic_packet_mode();
        assert_eq!(mac.registers().enables, (true, false));
        assert!(mac.registers().magic_packet_detection);

        mac.leave_magic_packet_mode();
        assert_eq!(mac.registers().enables, (true, true));
        assert!(!mac.registers().magic_packet_detection);
    }

    #[test]
    fn shutdown_never_reenables_transmit() {
        let mut mac = Mac::new(Registers::default());
        mac.enable(true, true);
        mac.enter_magic_packet_mode();

        mac.shutdown();
        assert_eq!(mac.registers().enables, (false, false));
        assert_eq!(
            mac.registers().enable_history,
            vec![(true, true), (true, false), (false, false)]
        );
        assert!(!mac.registers().magic_packet_detection);

        // Leaving magic packet mode later restores nothing.
        mac.leave_magic_packet_mode();
        assert_eq!(mac.registers().enables, (false, false));
    }
}
