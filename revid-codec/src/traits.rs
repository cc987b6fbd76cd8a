//! Codec engine traits and buffer slot tokens.

use revid_core::{FormatDescriptor, Result, SlotFlags, Unit};
use std::time::Duration;

/// Direction a codec instance was configured for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecDirection {
    /// Compressed samples in, raw frames out.
    Decode,
    /// Raw frames in, compressed units out.
    Encode,
}

/// An input buffer slot dequeued from a codec instance.
///
/// The token is move-only: [`CodecInstance::queue_input`] consumes it, so a
/// slot cannot be submitted twice and no reference to its payload can
/// outlive the submission.
#[derive(Debug)]
pub struct InputSlot {
    index: usize,
    capacity: usize,
}

impl InputSlot {
    /// Create a slot token. Called by codec engine implementations.
    pub fn new(index: usize, capacity: usize) -> Self {
        Self { index, capacity }
    }

    /// Slot index within the codec's buffer set.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Payload capacity of this slot in bytes.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// An output buffer slot dequeued from a codec instance.
///
/// Exclusively owned by the caller between dequeue and release; the payload
/// is read through [`CodecInstance::output_data`] and the token is consumed
/// by [`CodecInstance::release_output`].
#[derive(Debug)]
pub struct OutputSlot {
    index: usize,
    /// Presentation timestamp of the produced unit, in microseconds.
    pub pts_us: i64,
    /// Slot flags.
    pub flags: SlotFlags,
}

impl OutputSlot {
    /// Create a slot token. Called by codec engine implementations.
    pub fn new(index: usize, pts_us: i64, flags: SlotFlags) -> Self {
        Self {
            index,
            pts_us,
            flags,
        }
    }

    /// Slot index within the codec's buffer set.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Check whether this slot carries the end-of-stream flag.
    pub fn is_eos(&self) -> bool {
        self.flags.contains(SlotFlags::END_OF_STREAM)
    }
}

/// A stateful codec bound to one format descriptor and one direction.
///
/// Instances expose the buffer-queue protocol with bounded-wait semantics:
/// `dequeue_input` and `dequeue_output` may suspend the caller for up to
/// the given timeout before yielding `None` ("not ready yet") rather than
/// blocking indefinitely. An instance is created configured, started once,
/// and stopped at the end of its pump run; it is never reused across
/// phases.
pub trait CodecInstance {
    /// Direction this instance was configured for.
    fn direction(&self) -> CodecDirection;

    /// Start the codec.
    fn start(&mut self) -> Result<()>;

    /// Acquire a free input slot, waiting at most `timeout`.
    fn dequeue_input(&mut self, timeout: Duration) -> Result<Option<InputSlot>>;

    /// Submit a filled input slot.
    ///
    /// An empty payload with [`SlotFlags::END_OF_STREAM`] signals that no
    /// further input follows.
    fn queue_input(
        &mut self,
        slot: InputSlot,
        payload: &[u8],
        pts_us: i64,
        flags: SlotFlags,
    ) -> Result<()>;

    /// Acquire a ready output slot, waiting at most `timeout`.
    ///
    /// An end-of-stream slot is only produced after an end-of-stream input
    /// slot was submitted.
    fn dequeue_output(&mut self, timeout: Duration) -> Result<Option<OutputSlot>>;

    /// Read the payload of a dequeued output slot.
    fn output_data(&self, slot: &OutputSlot) -> Result<&[u8]>;

    /// Release an output slot back to the codec.
    fn release_output(&mut self, slot: OutputSlot) -> Result<()>;

    /// Stop the codec and release its buffer set.
    fn stop(&mut self) -> Result<()>;
}

/// Creates codec instances for concrete formats.
///
/// Configuration failures are reported as [`revid_core::Error::CodecConfig`]
/// and propagate to the caller; a missing decoder is an error result, not a
/// process abort.
pub trait CodecEngine {
    /// The instance type produced by this engine.
    type Instance: CodecInstance;

    /// Create a decoder configured for the given source format.
    fn create_decoder(&self, format: &FormatDescriptor) -> Result<Self::Instance>;

    /// Create an encoder configured for the given target format.
    fn create_encoder(&self, format: &FormatDescriptor) -> Result<Self::Instance>;
}

/// Pulls the next input unit for a pump.
pub trait UnitSource {
    /// Get the next unit, or `None` once the source is exhausted.
    ///
    /// The source cursor advances with each successful call; a pump only
    /// calls this once it holds a free input slot to submit into.
    fn next_unit(&mut self) -> Result<Option<Unit>>;
}

/// Persists units produced by a pump.
pub trait UnitSink {
    /// Write one produced unit. `eos` is set on the final unit of the
    /// stream (whose payload may be empty).
    fn write_unit(&mut self, data: &[u8], pts_us: i64, eos: bool) -> Result<()>;
}

impl<S: UnitSource + ?Sized> UnitSource for &mut S {
    fn next_unit(&mut self) -> Result<Option<Unit>> {
        (**self).next_unit()
    }
}

impl<S: UnitSink + ?Sized> UnitSink for &mut S {
    fn write_unit(&mut self, data: &[u8], pts_us: i64, eos: bool) -> Result<()> {
        (**self).write_unit(data, pts_us, eos)
    }
}
