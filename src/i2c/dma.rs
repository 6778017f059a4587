// Licensed under the Apache-2.0 license

//! DMA engine seam for bulk payload movement.
//!
//! The transfer engine only ever runs one DMA operation at a time and
//! always finishes a message's edges byte-wise (the first byte of a write,
//! the last two bytes of a read), so the interface is a simple
//! submit/poll/terminate triple. Platforms without usable channels plug in
//! [`NoDma`] and every transfer stays on the byte-wise path.

/// Shortest payload worth the DMA setup cost; shorter messages stay on the
/// byte-wise path.
pub const MIN_DMA_LEN: usize = 8;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DmaDirection {
    /// Memory to the transmit port.
    ToDevice,
    /// Receive port to memory.
    FromDevice,
}

/// A transmit/receive channel pair bound to one controller's data port.
pub trait DmaPair {
    /// A transmit channel exists and is idle.
    fn can_write(&self) -> bool;

    /// A receive channel exists and is idle.
    fn can_read(&self) -> bool;

    /// Start moving `buf` to the data port. Returns `false` if the channel
    /// could not be programmed; the engine then falls back to byte-wise
    /// transfer.
    fn submit_write(&mut self, buf: &[u8]) -> bool;

    /// Start filling `buf` from the data port. Same fallback contract as
    /// [`submit_write`](DmaPair::submit_write).
    fn submit_read(&mut self, buf: &mut [u8]) -> bool;

    /// Completed byte count of the active operation, once. `None` while
    /// still in flight or when nothing is active.
    fn poll_complete(&mut self) -> Option<usize>;

    /// Abort the active operation, if any.
    fn terminate(&mut self);
}

/// Placeholder for platforms without DMA channels.
#[derive(Default)]
pub struct NoDma;

impl DmaPair for NoDma {
    fn can_write(&self) -> bool {
        false
    }

    fn can_read(&self) -> bool {
        false
    }

    fn submit_write(&mut self, _buf: &[u8]) -> bool {
        false
    }

    fn submit_read(&mut self, _buf: &mut [u8]) -> bool {
        false
    }

    fn poll_complete(&mut self) -> Option<usize> {
        None
    }

    fn terminate(&mut self) {}
}
