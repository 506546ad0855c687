use crate::{
    config::Config,
    debug, error, info,
    interrupt::{InterruptFlags, InterruptHandle},
    link::{Link, LinkState},
    mac::{Mac, MacRegisters},
    negotiation::{decode_speed_duplex, resolve_pause},
    phy::Phy,
    platform::Platform,
    ring::{DesRing, RxHandle, TxHandle},
    statistics::Statistics,
    trace, warn, Error, LinkEvent, MacAddress, SpeedDuplex,
};

/// A received frame that has only partially been copied out to the caller.
struct PendingFrame {
    handle: RxHandle,
    length: usize,
    offset: usize,
}

/// An Ethernet interface driving one MAC, its DMA engine and the attached PHY.
///
/// # Note
/// Nothing happens in the background apart from the DMA engine moving frames and the interrupt
/// handler latching events. [Ethernet::service] must be called periodically for link changes to
/// take effect.
pub struct Ethernet<'a, Regs, Transceiver, Board, const RX: usize, const TX: usize>
where
    Regs: MacRegisters,
    Transceiver: Phy,
    Board: Platform,
{
    mac: Mac<Regs>,
    phy: Transceiver,
    board: Board,
    ring: &'a mut DesRing<RX, TX>,
    flags: &'a InterruptFlags,
    config: Config,
    link: Link,
    address: MacAddress,
    transfer_enabled: bool,
    speed_duplex: SpeedDuplex,
    pending: Option<PendingFrame>,
    statistics: Statistics,
    opened: bool,
}

impl<'a, Regs, Transceiver, Board, const RX: usize, const TX: usize>
    Ethernet<'a, Regs, Transceiver, Board, RX, TX>
where
    Regs: MacRegisters,
    Transceiver: Phy,
    Board: Platform,
{
    /// Construct a new, closed, Ethernet interface.
    ///
    /// # Args
    /// * `config` - The configuration of the interface.
    /// * `regs` - The MAC and DMA register block.
    /// * `phy` - The management interface of the attached PHY.
    /// * `board` - Clock, pin and interrupt controller access.
    /// * `ring` - Descriptor and buffer storage the DMA engine can reach.
    /// * `flags` - The flags shared with the Ethernet interrupt handler.
    pub fn new(
        config: Config,
        regs: Regs,
        phy: Transceiver,
        board: Board,
        ring: &'a mut DesRing<RX, TX>,
        flags: &'a InterruptFlags,
    ) -> Self {
        Self {
            mac: Mac::new(regs),
            phy,
            board,
            ring,
            flags,
            config,
            link: Link::new(),
            address: MacAddress::default(),
            transfer_enabled: false,
            speed_duplex: SpeedDuplex::NoLink,
            pending: None,
            statistics: Statistics::default(),
            opened: false,
        }
    }

    /// Bring up the interface and start auto-negotiation.
    ///
    /// # Note
    /// An interface that is already open is closed first. The link is not usable until a
    /// subsequent [Ethernet::service] reports that it came up.
    ///
    /// # Args
    /// * `address` - The station address of the interface.
    pub fn open(&mut self, address: MacAddress) -> Result<(), Error> {
        if self.opened {
            self.close();
        }

        self.address = address;

        self.board.enable_peripheral_clock();
        self.board.configure_pins();

        self.mac.reset(self.config.reset_settle_cycles());
        self.reset_statistics();

        let bases = self.ring.init();
        self.mac.configure(address, bases, self.config.endianness);

        if !self.phy.reset() {
            error!("PHY did not come out of reset");
            Statistics::bump(&mut self.statistics.phy_init_failures);
            return Err(Error::PhyInit);
        }

        self.phy.start_autonegotiate(self.config.pause_frames);

        self.flags.clear();
        self.mac.set_interrupts_enabled(true);
        if let Some(binding) = self.config.interrupt {
            self.board.bind_interrupt(binding.handler, binding.priority);
        }

        self.link.open();
        self.opened = true;

        Ok(())
    }

    /// Shut down the interface.
    ///
    /// # Note
    /// Closing an interface that is not open leaves the hardware untouched.
    pub fn close(&mut self) {
        if self.opened {
            if self.config.interrupt.is_some() {
                self.board.disable_interrupt();
            }
            self.mac.set_interrupts_enabled(false);
            self.mac.shutdown();
        }

        self.link.close();
        self.transfer_enabled = false;
        self.speed_duplex = SpeedDuplex::NoLink;

        // The ring is rebuilt on the next open, so a partially read frame is simply forgotten.
        self.pending = None;
        self.flags.clear();
        self.opened = false;
    }

    /// Act on the events latched by the interrupt handler.
    ///
    /// # Note
    /// Every link event is confirmed against the link-monitor level before it is acted on. Only the
    /// latest link event since the previous call is seen.
    ///
    /// # Returns
    /// True exactly when the link came up during this call.
    pub fn service(&mut self) -> bool {
        if !self.opened {
            return false;
        }

        if self.flags.take_magic_packet() && self.link.state() == LinkState::MagicPacketWait {
            info!("Magic packet received, restarting interface");

            let address = self.address;
            self.close();
            // A failure is counted in the statistics and leaves the interface closed, see
            // `is_open()`.
            if let Err(e) = self.open(address) {
                error!("Failed to reopen after wake: {}", e);
            }

            return false;
        }

        match self.flags.take_link_event() {
            LinkEvent::None => false,
            LinkEvent::Up => self.handle_link_up(),
            LinkEvent::Down => {
                self.handle_link_down();
                false
            }
        }
    }

    fn handle_link_up(&mut self) -> bool {
        if self.link.state() == LinkState::MagicPacketWait {
            return false;
        }

        // The status signal also drives an LED and is not trusted without the level.
        if !self.mac.link_monitor_level() {
            debug!("Ignoring unconfirmed link up event");
            return false;
        }

        let (local, partner) = self.phy.negotiation_result();
        let speed_duplex = decode_speed_duplex(local, partner);
        if speed_duplex == SpeedDuplex::NoLink {
            warn!(
                "No common mode: local {:#04x}, partner {:#04x}",
                local.0, partner.0
            );
            return false;
        }

        let pause = resolve_pause(local.pause_ability(), partner.pause_ability());
        debug!("Negotiated {:?}, pause {:?}", speed_duplex, pause);

        self.mac
            .configure_duplex_and_pause(speed_duplex, pause.transmit, pause.receive);
        self.mac.enable(true, true);
        self.transfer_enabled = true;
        self.speed_duplex = speed_duplex;

        self.link.link_up()
    }

    fn handle_link_down(&mut self) {
        if self.link.state() != LinkState::Up {
            return;
        }

        if self.mac.link_monitor_level() {
            debug!("Ignoring unconfirmed link down event");
            return;
        }

        self.mac.enable(false, false);
        self.transfer_enabled = false;
        self.speed_duplex = SpeedDuplex::NoLink;
        self.link.link_down();
    }

    /// Switch the interface into receive-only magic packet detection.
    ///
    /// # Note
    /// Once a magic packet is seen, the next [Ethernet::service] call restarts the interface.
    pub fn wake_on_lan(&mut self) -> Result<(), Error> {
        if self.link.state() != LinkState::Up {
            return Err(Error::LinkDown);
        }

        self.mac.enter_magic_packet_mode();

        if !self.mac.link_monitor_level() {
            warn!("Link lost while arming magic packet detection");
            self.mac.leave_magic_packet_mode();
            return Err(Error::LinkLostDuringArm);
        }

        self.link.arm();
        Ok(())
    }

    /// Copy received data into `dst`.
    ///
    /// # Note
    /// A frame larger than `dst` is returned over several calls. Its descriptor is only handed
    /// back to the DMA engine once the whole frame has been read.
    ///
    /// # Returns
    /// The number of bytes copied. Zero if no frame is available or the link is not up.
    pub fn read(&mut self, dst: &mut [u8]) -> usize {
        if self.link.state() != LinkState::Up || dst.is_empty() {
            return 0;
        }

        let Some(mut frame) = self.next_frame() else {
            return 0;
        };

        let data = self.ring.rx_frame(&frame.handle, frame.length);
        let len = core::cmp::min(dst.len(), frame.length - frame.offset);
        dst[..len].copy_from_slice(&data[frame.offset..][..len]);
        frame.offset += len;

        if frame.offset < frame.length {
            self.pending.replace(frame);
        } else {
            self.finish_frame(frame);
        }

        len
    }

    /// Lend the next received frame to `f` without copying it.
    ///
    /// # Note
    /// If a frame has been partially consumed by [Ethernet::read], only its unread remainder is
    /// provided.
    ///
    /// # Returns
    /// The result of `f`, or `None` if no frame is available or the link is not up.
    pub fn receive_with<R, F>(&mut self, f: F) -> Option<R>
    where
        F: FnOnce(&[u8]) -> R,
    {
        if self.link.state() != LinkState::Up {
            return None;
        }

        let frame = self.next_frame()?;
        let result = f(&self.ring.rx_frame(&frame.handle, frame.length)[frame.offset..]);
        self.finish_frame(frame);

        Some(result)
    }

    fn next_frame(&mut self) -> Option<PendingFrame> {
        if let Some(frame) = self.pending.take() {
            return Some(frame);
        }

        let (handle, length) = self.ring.rx.try_take(&mut self.statistics, &mut self.mac)?;
        trace!("Received {} bytes in RX slot {}", length, handle.index());

        Some(PendingFrame {
            handle,
            length,
            offset: 0,
        })
    }

    fn finish_frame(&mut self, frame: PendingFrame) {
        self.statistics.record_rx(frame.length);

        if self.ring.rx.release(frame.handle, &mut self.mac) {
            Statistics::bump(&mut self.statistics.rx_restarts);
        }
    }

    /// Transmit a frame made of `header` followed by `body`.
    ///
    /// # Note
    /// Both parts are copied contiguously into a single transmit buffer. The MAC appends the frame
    /// check sequence.
    pub fn write(&mut self, header: &[u8], body: &[u8]) -> Result<(), Error> {
        let length = header.len() + body.len();
        let handle = self.claim_transmit(length)?;

        let buffer = self.ring.tx_buffer(&handle);
        buffer[..header.len()].copy_from_slice(header);
        buffer[header.len()..length].copy_from_slice(body);

        self.submit(handle, length);
        Ok(())
    }

    /// Lend a transmit buffer of `length` bytes to `f`, then transmit it.
    ///
    /// # Returns
    /// The result of `f`.
    pub fn transmit_with<R, F>(&mut self, length: usize, f: F) -> Result<R, Error>
    where
        F: FnOnce(&mut [u8]) -> R,
    {
        let handle = self.claim_transmit(length)?;
        let result = f(&mut self.ring.tx_buffer(&handle)[..length]);
        self.submit(handle, length);

        Ok(result)
    }

    fn claim_transmit(&mut self, length: usize) -> Result<TxHandle, Error> {
        if self.link.state() == LinkState::MagicPacketWait {
            return Err(Error::MagicPacketMode);
        }

        if !self.transfer_enabled {
            return Err(Error::LinkDown);
        }

        let Some((handle, capacity)) = self.ring.tx.try_give(&mut self.statistics) else {
            Statistics::bump(&mut self.statistics.tx_busy);
            return Err(Error::BufferFull);
        };

        if length > capacity {
            Statistics::bump(&mut self.statistics.tx_length_errors);
            return Err(Error::FrameTooLarge);
        }

        Ok(handle)
    }

    fn submit(&mut self, handle: TxHandle, length: usize) {
        trace!("Transmitting {} bytes from TX slot {}", length, handle.index());
        self.ring.tx.submit(handle, length, &mut self.mac);
        self.statistics.record_tx(length);
    }

    /// Get a snapshot of the interface counters.
    pub fn get_statistics(&self) -> Statistics {
        Statistics {
            rx_interrupts: self.flags.rx_interrupts(),
            tx_interrupts: self.flags.tx_interrupts(),
            rx_unavailable: self.flags.rx_unavailable(),
            link_up: self.transfer_enabled,
            speed_duplex: self.speed_duplex,
            ..self.statistics
        }
    }

    /// Clear all counters.
    pub fn reset_statistics(&mut self) {
        self.statistics = Statistics::default();
        self.flags.reset_counters();
    }

    /// The station address the interface was last opened with.
    pub fn get_mac_address(&self) -> MacAddress {
        self.address
    }

    /// Query the PHY for the current link status.
    pub fn check_link(&mut self) -> bool {
        self.phy.link_level()
    }

    /// Determine if the interface is open.
    ///
    /// # Note
    /// An interface that failed to restart after a magic packet is closed and has to be reopened
    /// with [Ethernet::open].
    pub fn is_open(&self) -> bool {
        self.opened
    }

    pub fn link_state(&self) -> LinkState {
        self.link.state()
    }

    /// The handle to pass into the Ethernet interrupt handler.
    pub fn interrupt_handle(&self) -> InterruptHandle<'a> {
        self.flags.handle()
    }
}
