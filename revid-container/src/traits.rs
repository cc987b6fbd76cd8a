//! The demuxer collaborator trait.

use revid_core::{FormatDescriptor, Result, Unit};
use std::io::{Read, Seek};

/// One track exposed by a demultiplexed container.
///
/// Read-only, owned by the container for its lifetime.
#[derive(Debug, Clone)]
pub struct TrackInfo {
    /// Track index in container order.
    pub index: usize,
    /// Media-type string, e.g. `video/avc` or `audio/mp4a-latm`.
    pub media_type: String,
    /// Format descriptor for the track's elementary stream.
    pub format: FormatDescriptor,
}

/// Demuxer trait for reading compressed samples out of a container.
///
/// The input is an already-open readable handle plus its byte extent; the
/// host environment's storage permission model may not expose a path for
/// it, so none is ever required. Malformed or unreadable containers are
/// reported as [`revid_core::Error::Extractor`].
pub trait Demuxer {
    /// Open a container from a readable, seekable handle spanning `len`
    /// bytes.
    fn open<R: Read + Seek + Send + 'static>(&mut self, reader: R, len: u64) -> Result<()>;

    /// Get the number of tracks.
    fn num_tracks(&self) -> usize;

    /// Get track information, in container order.
    fn track_info(&self, index: usize) -> Option<&TrackInfo>;

    /// Restrict sample reads to the given track.
    fn select_track(&mut self, index: usize) -> Result<()>;

    /// Read the next compressed sample of the selected track, with its
    /// presentation timestamp, advancing the sample cursor. Returns `None`
    /// once the track is exhausted.
    fn next_sample(&mut self) -> Result<Option<Unit>>;
}
