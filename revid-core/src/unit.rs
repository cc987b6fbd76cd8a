//! Transfer units flowing through the codec pumps.

use bitflags::bitflags;

bitflags! {
    /// Flags attached to a buffer slot when it is queued or dequeued.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SlotFlags: u32 {
        /// No further data follows this slot.
        const END_OF_STREAM = 0x0001;
    }
}

/// One unit of pump traffic: a compressed sample on the decode side, a raw
/// frame chunk on the encode side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unit {
    /// The unit payload.
    pub data: Vec<u8>,
    /// Presentation timestamp in microseconds.
    pub pts_us: i64,
}

impl Unit {
    /// Create a new unit.
    pub fn new(data: Vec<u8>, pts_us: i64) -> Self {
        Self { data, pts_us }
    }

    /// Get the payload size in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }
}
