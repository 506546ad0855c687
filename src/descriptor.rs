//! Hardware-visible DMA descriptors
//!
//! Descriptor layout, one 32-bit word each:
//!
//! | Word | Contents |
//! |------|----------|
//! | 0 | Status: OWN, LAST-IN-RING, first/last segment, error flags |
//! | 1 | Size: frame length (bits 0..16), buffer capacity (bits 16..32) |
//! | 2 | Buffer bus address |
//! | 3 | Bus address of the next descriptor in the ring |
//!
//! The DMA engine writes the status and length words of descriptors it owns. Software only
//! touches a descriptor once the OWN bit is clear, and hands it back by setting the OWN bit as
//! the very last store.
use bit_field::BitField;
use core::ops::Range;
use core::ptr;
use core::sync::atomic::{self, Ordering};
use num_enum::{IntoPrimitive, TryFromPrimitive};

mod status {
    use core::ops::Range;

    /// Set while the DMA engine owns the descriptor.
    pub const OWN: usize = 31;
    /// Marks the final descriptor of a ring.
    pub const LAST_IN_RING: usize = 30;
    /// The buffer holds the first segment of a frame.
    pub const FIRST_SEGMENT: usize = 29;
    /// The buffer holds the last segment of a frame.
    pub const LAST_SEGMENT: usize = 28;
    /// Receive error flags, see [super::RxError].
    pub const RX_ERRORS: Range<usize> = 0..6;
    /// Transmit error flags, see [super::TxError].
    pub const TX_ERRORS: Range<usize> = 8..12;
}

mod size {
    use core::ops::Range;

    pub const LENGTH: Range<usize> = 0..16;
    pub const CAPACITY: Range<usize> = 16..32;
}

/// Frame-level receive errors reported by the DMA engine.
#[derive(Copy, Clone, Debug, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum RxError {
    /// The receive FIFO overflowed while the frame was being stored.
    Overflow = 0,
    /// The frame did not end on an octet boundary.
    Alignment = 1,
    /// The frame was shorter than the 64-byte minimum.
    Runt = 2,
    /// The frame check sequence did not match.
    Crc = 3,
    /// The PHY signalled a receive or preamble error.
    Phy = 4,
    /// The destination address did not pass the address filter.
    AddressFilter = 5,
}

/// Transmit errors reported by the DMA engine in a completed descriptor.
#[derive(Copy, Clone, Debug, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum TxError {
    /// The transmit FIFO ran dry mid-frame.
    Underflow = 0,
    /// The frame was aborted after excessive collisions.
    Collision = 1,
    /// The frame was deferred past the deferral limit.
    Deferred = 2,
    /// The MAC failed to generate a valid frame check sequence.
    Crc = 3,
}

/// A set of error flags taken from a descriptor status word.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct ErrorFlags(u8);

impl ErrorFlags {
    pub fn rx(&self, error: RxError) -> bool {
        self.0.get_bit(u8::from(error) as usize)
    }

    pub fn tx(&self, error: TxError) -> bool {
        self.0.get_bit(u8::from(error) as usize)
    }
}

/// Whether a completed descriptor carries a usable frame.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Completion {
    Valid,
    Errored(ErrorFlags),
}

/// Which side of the DMA boundary currently owns a descriptor.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Ownership {
    Hardware,
    Software(Completion),
}

/// Direction of the ring a descriptor belongs to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Direction {
    Rx,
    Tx,
}

impl Direction {
    fn errors(self) -> Range<usize> {
        match self {
            Direction::Rx => status::RX_ERRORS,
            Direction::Tx => status::TX_ERRORS,
        }
    }
}

/// A single DMA descriptor.
///
/// Note that Copy and Clone are derived to support initialising an array of descriptors in a
/// `const` context, but a descriptor may not be moved after its address has been given to the DMA
/// engine.
#[derive(Copy, Clone)]
#[repr(C, align(16))]
pub(crate) struct Descriptor {
    status: u32,
    size: u32,
    // Only read by the DMA engine.
    #[allow(dead_code)]
    buffer: u32,
    #[allow(dead_code)]
    next: u32,
}

impl Descriptor {
    pub const fn new() -> Self {
        Self {
            status: 0,
            size: 0,
            buffer: 0,
            next: 0,
        }
    }

    /// Bind this descriptor to its buffer and successor.
    ///
    /// # Args
    /// * `buffer` - Bus address of the buffer owned by this slot.
    /// * `capacity` - Size of the buffer in bytes.
    /// * `next` - Bus address of the next descriptor in the ring.
    /// * `last` - Specified true for the final descriptor of the ring.
    /// * `hardware` - Specified true to hand the empty descriptor to the DMA engine.
    pub fn init(&mut self, buffer: u32, capacity: usize, next: u32, last: bool, hardware: bool) {
        self.buffer = buffer;
        self.next = next;
        let mut word = 0u32;
        word.set_bits(size::CAPACITY, capacity as u32);
        self.write_size(word);

        let mut word = 0u32;
        word.set_bit(status::LAST_IN_RING, last);
        self.write_status(word);

        if hardware {
            self.give();
        }
    }

    /// The bus address of this descriptor as seen by the DMA engine.
    pub fn address(&self) -> u32 {
        self as *const Self as usize as u32
    }

    pub fn ownership(&self, direction: Direction) -> Ownership {
        let word = self.read_status();

        if word.get_bit(status::OWN) {
            return Ownership::Hardware;
        }

        // Keep the buffer reads that follow from being hoisted above the OWN check.
        atomic::fence(Ordering::Acquire);

        let errors = word.get_bits(direction.errors()) as u8;
        if errors != 0 {
            Ownership::Software(Completion::Errored(ErrorFlags(errors)))
        } else {
            Ownership::Software(Completion::Valid)
        }
    }

    /// Determine if the frame is contained entirely in this descriptor's buffer.
    pub fn is_whole_frame(&self) -> bool {
        let word = self.read_status();
        word.get_bit(status::FIRST_SEGMENT) && word.get_bit(status::LAST_SEGMENT)
    }

    pub fn is_last_in_ring(&self) -> bool {
        self.read_status().get_bit(status::LAST_IN_RING)
    }

    pub fn length(&self) -> usize {
        self.read_size().get_bits(size::LENGTH) as usize
    }

    pub fn capacity(&self) -> usize {
        self.read_size().get_bits(size::CAPACITY) as usize
    }

    /// Clear every status flag except the ring-wrap marker and hand the descriptor back to the
    /// DMA engine.
    pub fn recycle(&mut self) {
        let mut word = 0u32;
        word.set_bit(status::LAST_IN_RING, self.is_last_in_ring());
        self.write_status(word);

        let mut word = 0u32;
        word.set_bits(size::CAPACITY, self.capacity() as u32);
        self.write_size(word);

        self.give();
    }

    /// Drop any error flags left behind by a previous transmission.
    pub fn clear_errors(&mut self, direction: Direction) {
        let mut word = self.read_status();
        word.set_bits(direction.errors(), 0);
        self.write_status(word);
    }

    /// Describe a single-buffer frame of `length` bytes and hand it to the DMA engine.
    pub fn stamp(&mut self, length: usize) {
        let mut word = self.read_size();
        word.set_bits(size::LENGTH, length as u32);
        self.write_size(word);

        let mut word = 0u32;
        word.set_bit(status::LAST_IN_RING, self.is_last_in_ring())
            .set_bit(status::FIRST_SEGMENT, true)
            .set_bit(status::LAST_SEGMENT, true);
        self.write_status(word);

        self.give();
    }

    fn give(&mut self) {
        // Every other descriptor and buffer store must be visible before the DMA engine can see
        // the OWN bit.
        atomic::fence(Ordering::Release);

        let mut word = self.read_status();
        word.set_bit(status::OWN, true);
        self.write_status(word);
    }

    fn read_status(&self) -> u32 {
        // Safety: The reference guarantees a valid, aligned location. The volatile access keeps
        // the compiler from caching a word the DMA engine may rewrite at any time.
        unsafe { ptr::read_volatile(&self.status) }
    }

    fn write_status(&mut self, value: u32) {
        // Safety: See `read_status()`.
        unsafe { ptr::write_volatile(&mut self.status, value) }
    }

    fn read_size(&self) -> u32 {
        // Safety: See `read_status()`.
        unsafe { ptr::read_volatile(&self.size) }
    }

    fn write_size(&mut self, value: u32) {
        // Safety: See `read_status()`.
        unsafe { ptr::write_volatile(&mut self.size, value) }
    }
}

/// Writes performed by the DMA engine, for simulating hardware in tests.
#[cfg(test)]
impl Descriptor {
    pub fn buffer(&self) -> u32 {
        self.buffer
    }

    pub fn next(&self) -> u32 {
        self.next
    }

    pub fn is_hardware_owned(&self) -> bool {
        self.read_status().get_bit(status::OWN)
    }

    /// Complete a reception: store the length and flags, then release ownership.
    pub fn complete_rx(&mut self, length: usize, whole: bool, errors: &[RxError]) {
        assert!(self.is_hardware_owned());

        let mut word = self.read_size();
        word.set_bits(size::LENGTH, length as u32);
        self.write_size(word);

        let mut word = self.read_status();
        word.set_bit(status::OWN, false)
            .set_bit(status::FIRST_SEGMENT, whole)
            .set_bit(status::LAST_SEGMENT, whole);
        for error in errors {
            word.set_bit(status::RX_ERRORS.start + u8::from(*error) as usize, true);
        }
        self.write_status(word);
    }

    /// Complete a transmission and release ownership.
    pub fn complete_tx(&mut self, errors: &[TxError]) {
        assert!(self.is_hardware_owned());

        let mut word = self.read_status();
        word.set_bit(status::OWN, false);
        for error in errors {
            word.set_bit(status::TX_ERRORS.start + u8::from(*error) as usize, true);
        }
        self.write_status(word);
    }
}
