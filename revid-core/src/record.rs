//! Frame records and their sidecar encoding.
//!
//! Raw decoded frame bytes are not self-describing: unlike a container,
//! they cannot be re-parsed by scanning. Every unit that flows through a
//! pump is therefore captured as a [`FrameRecord`] describing how to
//! re-slice the raw byte sequence, and the record sequence is persisted as
//! a fixed-width sidecar next to the data file.

use crate::error::{Error, Result};
use bitflags::bitflags;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};

bitflags! {
    /// Flags carried on a frame record.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct RecordFlags: u32 {
        /// This record marks the end of the stream.
        const END_OF_STREAM = 0x0001;
    }
}

/// Describes one unit in the intermediate store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameRecord {
    /// Byte offset of the frame payload within the data file.
    pub offset: u64,
    /// Payload length in bytes.
    pub len: u64,
    /// Presentation timestamp in microseconds.
    pub pts_us: i64,
    /// Record flags.
    pub flags: RecordFlags,
}

impl FrameRecord {
    /// Encoded size of one record in the sidecar, in bytes.
    pub const ENCODED_LEN: usize = 28;

    /// Create a new record.
    pub fn new(offset: u64, len: u64, pts_us: i64) -> Self {
        Self {
            offset,
            len,
            pts_us,
            flags: RecordFlags::empty(),
        }
    }

    /// Create the terminal end-of-stream record at the given offset.
    pub fn end_of_stream(offset: u64, pts_us: i64) -> Self {
        Self {
            offset,
            len: 0,
            pts_us,
            flags: RecordFlags::END_OF_STREAM,
        }
    }

    /// Check whether this record marks the end of the stream.
    pub fn is_eos(&self) -> bool {
        self.flags.contains(RecordFlags::END_OF_STREAM)
    }

    /// Serialize this record to a writer (little-endian).
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u64::<LittleEndian>(self.offset)?;
        writer.write_u64::<LittleEndian>(self.len)?;
        writer.write_i64::<LittleEndian>(self.pts_us)?;
        writer.write_u32::<LittleEndian>(self.flags.bits())?;
        Ok(())
    }

    /// Deserialize one record from a reader.
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let offset = reader.read_u64::<LittleEndian>()?;
        let len = reader.read_u64::<LittleEndian>()?;
        let pts_us = reader.read_i64::<LittleEndian>()?;
        let bits = reader.read_u32::<LittleEndian>()?;
        let flags = RecordFlags::from_bits(bits)
            .ok_or_else(|| Error::invalid_param(format!("unknown record flags {bits:#x}")))?;
        Ok(Self {
            offset,
            len,
            pts_us,
            flags,
        })
    }
}
