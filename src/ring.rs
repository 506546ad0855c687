//! Descriptor rings
//!
//! # Design
//! Each ring is a fixed array of descriptors walked by a single software cursor. The cursor only
//! ever points at the oldest slot software has not yet given back, so at most one descriptor per
//! ring is held by software at the cursor at any time. Slots are addressed by index; buffer
//! addresses only appear in the descriptor words the DMA engine reads.
use crate::{
    arena::{BufferArena, BUFFER_SIZE},
    debug,
    descriptor::{Completion, Descriptor, Direction, Ownership},
    statistics::Statistics,
    trace, HEADER_LENGTH,
};

/// Run-state control of the DMA engine, as needed to restart a stalled ring.
pub trait Dma {
    /// Determine if the receive engine is still polling descriptors.
    fn rx_running(&self) -> bool;

    /// Issue the receive-start (poll demand) command.
    fn resume_rx(&mut self);

    /// Determine if the transmit engine is still processing descriptors.
    fn tx_running(&self) -> bool;

    /// Issue the transmit-start (poll demand) command.
    fn resume_tx(&mut self);
}

/// A received frame lent to software. Must be handed back through [RxRing::release].
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct RxHandle {
    index: usize,
}

impl RxHandle {
    pub fn index(&self) -> usize {
        self.index
    }
}

/// A transmit buffer lent to software. Must be handed back through [TxRing::submit].
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct TxHandle {
    index: usize,
}

impl TxHandle {
    pub fn index(&self) -> usize {
        self.index
    }
}

pub(crate) struct RxRing<const N: usize> {
    pub(crate) descriptors: [Descriptor; N],
    index: usize,
}

impl<const N: usize> RxRing<N> {
    const fn new() -> Self {
        Self {
            descriptors: [Descriptor::new(); N],
            index: 0,
        }
    }

    #[cfg(test)]
    pub fn cursor(&self) -> usize {
        self.index
    }

    /// Take the next good frame from the ring.
    ///
    /// # Note
    /// Errored or malformed frames found on the way are recorded in `statistics` and given back to
    /// the DMA engine immediately.
    ///
    /// # Returns
    /// The handle of the received frame and its length, or `None` if the DMA engine has not
    /// completed any more frames.
    pub fn try_take(
        &mut self,
        statistics: &mut Statistics,
        dma: &mut impl Dma,
    ) -> Option<(RxHandle, usize)> {
        // Every slot is inspected at most once so a ring full of garbage cannot keep us here.
        for _ in 0..N {
            let descriptor = &self.descriptors[self.index];

            match descriptor.ownership(Direction::Rx) {
                Ownership::Hardware => return None,
                Ownership::Software(Completion::Errored(flags)) => {
                    debug!("Dropping errored frame in RX slot {}: {:?}", self.index, flags);
                    statistics.rx_errors.record(flags);
                }
                Ownership::Software(Completion::Valid) => {
                    let length = descriptor.length();

                    if descriptor.is_whole_frame()
                        && length >= HEADER_LENGTH
                        && length <= descriptor.capacity()
                    {
                        return Some((RxHandle { index: self.index }, length));
                    }

                    debug!("Dropping malformed frame of {} bytes", length);
                    Statistics::bump(&mut statistics.rx_length_errors);
                }
            }

            if self.recycle(dma) {
                Statistics::bump(&mut statistics.rx_restarts);
            }
        }

        None
    }

    /// Hand a frame buffer back to the DMA engine.
    ///
    /// # Returns
    /// True if the receive engine had stalled on a full ring and was restarted.
    pub fn release(&mut self, handle: RxHandle, dma: &mut impl Dma) -> bool {
        debug_assert_eq!(handle.index, self.index);
        self.recycle(dma)
    }

    fn recycle(&mut self, dma: &mut impl Dma) -> bool {
        self.descriptors[self.index].recycle();
        self.index = (self.index + 1) % N;

        // A full ring suspends the receive engine. It does not notice freed descriptors on its own.
        if !dma.rx_running() {
            trace!("Restarting stalled RX DMA");
            dma.resume_rx();
            return true;
        }

        false
    }
}

pub(crate) struct TxRing<const N: usize> {
    pub(crate) descriptors: [Descriptor; N],
    index: usize,
}

impl<const N: usize> TxRing<N> {
    const fn new() -> Self {
        Self {
            descriptors: [Descriptor::new(); N],
            index: 0,
        }
    }

    #[cfg(test)]
    pub fn cursor(&self) -> usize {
        self.index
    }

    /// Borrow the next free transmit slot.
    ///
    /// # Note
    /// Errors the DMA engine reported for the previous frame in this slot are recorded in
    /// `statistics` before the slot is reused.
    ///
    /// # Returns
    /// The handle of the slot and the capacity of its buffer, or `None` if the DMA engine still
    /// owns it (ring full).
    pub fn try_give(&mut self, statistics: &mut Statistics) -> Option<(TxHandle, usize)> {
        let descriptor = &mut self.descriptors[self.index];

        match descriptor.ownership(Direction::Tx) {
            Ownership::Hardware => return None,
            Ownership::Software(Completion::Errored(flags)) => {
                debug!("TX slot {} completed with errors: {:?}", self.index, flags);
                statistics.tx_errors.record(flags);
                descriptor.clear_errors(Direction::Tx);
            }
            Ownership::Software(Completion::Valid) => {}
        }

        Some((TxHandle { index: self.index }, descriptor.capacity()))
    }

    /// Queue `length` bytes of a slot's buffer for transmission.
    ///
    /// # Returns
    /// True if the transmit engine was idle and had to be restarted.
    pub fn submit(&mut self, handle: TxHandle, length: usize, dma: &mut impl Dma) -> bool {
        debug_assert_eq!(handle.index, self.index);

        self.descriptors[self.index].stamp(length);
        self.index = (self.index + 1) % N;

        if !dma.tx_running() {
            dma.resume_tx();
            return true;
        }

        false
    }
}

/// Descriptor rings and their buffers.
///
/// # Note
/// This must live at a fixed address in memory the DMA engine can reach for as long as the driver
/// runs, typically as a `static`:
///
/// ```ignore
/// #[link_section = ".axisram.eth"]
/// static mut RING: minimac::DesRing<4, 4> = minimac::DesRing::new();
/// ```
///
/// Both rings need at least one descriptor:
///
/// ```compile_fail
/// static RING: minimac::DesRing<0, 4> = minimac::DesRing::new();
/// ```
pub struct DesRing<const RX: usize, const TX: usize> {
    pub(crate) rx: RxRing<RX>,
    pub(crate) tx: TxRing<TX>,
    arena: BufferArena<RX, TX>,
}

impl<const RX: usize, const TX: usize> DesRing<RX, TX> {
    const NOT_EMPTY: () = assert!(RX > 0 && TX > 0, "descriptor rings must not be empty");

    pub const fn new() -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::NOT_EMPTY;

        Self {
            rx: RxRing::new(),
            tx: TxRing::new(),
            arena: BufferArena::new(),
        }
    }

    /// Bind every descriptor to its buffer and close both rings into circles.
    ///
    /// # Note
    /// Receive descriptors are handed to the DMA engine empty. Transmit descriptors stay with
    /// software until a frame is submitted.
    ///
    /// # Returns
    /// The bus addresses of the first receive and first transmit descriptors.
    pub(crate) fn init(&mut self) -> (u32, u32) {
        for i in 0..RX {
            let next = self.rx.descriptors[(i + 1) % RX].address();
            let buffer = self.arena.rx(i).address();
            self.rx.descriptors[i].init(buffer, BUFFER_SIZE, next, i == RX - 1, true);
        }
        self.rx.index = 0;

        for i in 0..TX {
            let next = self.tx.descriptors[(i + 1) % TX].address();
            let buffer = self.arena.tx(i).address();
            self.tx.descriptors[i].init(buffer, BUFFER_SIZE, next, i == TX - 1, false);
        }
        self.tx.index = 0;

        (self.rx.descriptors[0].address(), self.tx.descriptors[0].address())
    }

    /// The received bytes of a frame lent to software.
    pub(crate) fn rx_frame(&self, handle: &RxHandle, length: usize) -> &[u8] {
        &self.arena.rx(handle.index).as_slice()[..length]
    }

    /// The whole buffer of a transmit slot lent to software.
    pub(crate) fn tx_buffer(&mut self, handle: &TxHandle) -> &mut [u8] {
        self.arena.tx_mut(handle.index).as_mut_slice()
    }

    #[cfg(test)]
    pub(crate) fn rx_buffer_mut(&mut self, index: usize) -> &mut [u8] {
        self.arena.rx_mut(index).as_mut_slice()
    }

    #[cfg(test)]
    pub(crate) fn tx_frame(&self, index: usize) -> &[u8] {
        let length = self.tx.descriptors[index].length();
        &self.arena.tx(index).as_slice()[..length]
    }
}

impl<const RX: usize, const TX: usize> Default for DesRing<RX, TX> {
    fn default() -> Self {
        Self::new()
    }
}
