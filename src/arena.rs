//! Static frame buffer storage
//!
//! # Design
//! Every descriptor is bound to exactly one buffer when the ring is initialized, and that binding
//! never changes. There is no free list: ownership of a buffer's contents follows ownership of its
//! descriptor, while the buffer slot itself always belongs to the ring.

/// Size of one frame buffer in bytes.
///
/// Holds a maximum-length frame (1518 bytes) rounded up to the DMA alignment.
pub const BUFFER_SIZE: usize = 1536;

/// A single frame buffer, aligned as the DMA engine requires.
///
/// # Note
/// `Copy` is only derived to allow initializing arrays of buffers in a `const` context. A buffer
/// must not be moved once its address has been handed to the DMA engine.
#[derive(Copy, Clone)]
#[repr(C, align(32))]
pub struct Buffer([u8; BUFFER_SIZE]);

impl Buffer {
    pub const fn new() -> Self {
        Buffer([0; BUFFER_SIZE])
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.0
    }

    /// The bus address of the buffer as seen by the DMA engine.
    pub fn address(&self) -> u32 {
        self.0.as_ptr() as usize as u32
    }
}

impl Default for Buffer {
    fn default() -> Self {
        Self::new()
    }
}

/// The buffer pool backing both descriptor rings.
pub struct BufferArena<const RX: usize, const TX: usize> {
    rx: [Buffer; RX],
    tx: [Buffer; TX],
}

impl<const RX: usize, const TX: usize> BufferArena<RX, TX> {
    pub const fn new() -> Self {
        Self {
            rx: [Buffer::new(); RX],
            tx: [Buffer::new(); TX],
        }
    }

    pub fn rx(&self, index: usize) -> &Buffer {
        &self.rx[index]
    }

    pub fn rx_mut(&mut self, index: usize) -> &mut Buffer {
        &mut self.rx[index]
    }

    pub fn tx(&self, index: usize) -> &Buffer {
        &self.tx[index]
    }

    pub fn tx_mut(&mut self, index: usize) -> &mut Buffer {
        &mut self.tx[index]
    }
}

impl<const RX: usize, const TX: usize> Default for BufferArena<RX, TX> {
    fn default() -> Self {
        Self::new()
    }
}
