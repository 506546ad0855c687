//! Board glue outside of the MAC itself
/// Clock gating, pin multiplexing and interrupt controller access for the Ethernet peripheral.
pub trait Platform {
    /// Ungate the MAC and DMA clocks.
    fn enable_peripheral_clock(&mut self);

    /// Route the MII/RMII signals and the link-monitor input to the MAC.
    fn configure_pins(&mut self);

    /// Install `handler` on the Ethernet interrupt vector and unmask it.
    fn bind_interrupt(&mut self, handler: fn(), priority: u8);

    /// Mask the Ethernet interrupt vector.
    fn disable_interrupt(&mut self);
}
