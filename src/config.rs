use crate::Endianness;
use embedded_time::duration::{Extensions, Microseconds};
use embedded_time::rate::Hertz;

/// The Ethernet interrupt handler and its priority.
#[derive(Copy, Clone, Debug)]
pub(crate) struct InterruptBinding {
    pub handler: fn(),
    pub priority: u8,
}

/// Configuration specifying how the driver sets up the MAC.
#[derive(Copy, Clone, Debug)]
pub struct Config {
    pub(crate) core_clock: Hertz<u32>,
    pub(crate) pause_frames: bool,
    pub(crate) endianness: Endianness,
    pub(crate) reset_settle_time: Microseconds<u32>,
    pub(crate) interrupt: Option<InterruptBinding>,
}

impl Config {
    /// Construct configuration for the driver.
    ///
    /// # Args
    /// * `core_clock` - The frequency the CPU runs at. Used to size busy-waits.
    pub fn new(core_clock: Hertz<u32>) -> Self {
        Self {
            core_clock,
            pause_frames: false,
            endianness: Endianness::Little,
            reset_settle_time: 100_u32.microseconds(),
            interrupt: None,
        }
    }

    /// Specify if pause frame support should be advertised during auto-negotiation.
    ///
    /// # Note
    /// Whether pause frames are actually used depends on the link partner and the negotiated
    /// duplex mode.
    pub fn pause_frames(mut self, enabled: bool) -> Self {
        self.pause_frames = enabled;
        self
    }

    /// Configure the byte order the DMA engine uses for descriptors and frame data.
    pub fn endianness(mut self, endianness: Endianness) -> Self {
        self.endianness = endianness;
        self
    }

    /// Configure how long to wait after a MAC reset before touching any other register.
    pub fn reset_settle_time(mut self, time: Microseconds<u32>) -> Self {
        self.reset_settle_time = time;
        self
    }

    /// Bind an interrupt handler when the driver is opened.
    ///
    /// # Note
    /// Without this, no handler is bound and the application is responsible for calling
    /// [crate::InterruptHandle::on_interrupt] from its own Ethernet interrupt.
    ///
    /// # Args
    /// * `handler` - The interrupt handler.
    /// * `priority` - The priority of the interrupt in the interrupt controller.
    pub fn interrupt(mut self, handler: fn(), priority: u8) -> Self {
        self.interrupt.replace(InterruptBinding { handler, priority });
        self
    }

    /// The number of busy-wait cycles covering the reset settle time.
    pub(crate) fn reset_settle_cycles(&self) -> u32 {
        let cycles_per_us = core::cmp::max(self.core_clock.0 / 1_000_000, 1);
        cycles_per_us.saturating_mul(self.reset_settle_time.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handler() {}

    #[test]
    fn settle_cycles() {
        let config = Config::new(Hertz(96_000_000));
        assert_eq!(config.reset_settle_cycles(), 9_600);

        let config = config.reset_settle_time(Microseconds(10));
        assert_eq!(config.reset_settle_cycles(), 960);

        // Slow clocks still wait at least one cycle per microsecond.
        let config = Config::new(Hertz(32_768));
        assert_eq!(config.reset_settle_cycles(), 100);
    }

    #[test]
    fn builder() {
        let config = Config::new(Hertz(48_000_000))
            .pause_frames(true)
            .endianness(Endianness::Big)
            .interrupt(handler, 3);

        assert!(config.pause_frames);
        assert_eq!(config.endianness, Endianness::Big);
        assert_eq!(config.interrupt.map(|binding| binding.priority), Some(3));
        assert!(Config::new(Hertz(1)).interrupt.is_none());
    }
}
