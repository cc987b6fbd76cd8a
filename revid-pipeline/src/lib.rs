//! # Revid Pipeline
//!
//! Converts a compressed video stream, reachable only through an open file
//! handle, into an H.264/AVC stream at a caller-specified resolution and a
//! fixed 30 fps frame rate.
//!
//! The conversion runs in two strictly sequential phases: a decode pump
//! drains the container's video track into an intermediate frame store,
//! then an encode pump re-compresses the stored frames into the output
//! file. Both phases share the engine-agnostic [`revid_codec::CodecPump`].
//!
//! ```no_run
//! # use revid_pipeline::{ContainerInput, Converter, TargetResolution};
//! # fn demo<D, E>(demuxer: D, engine: E) -> revid_core::Result<()>
//! # where
//! #     D: revid_container::Demuxer,
//! #     E: revid_codec::CodecEngine,
//! # {
//! // The host hands over a duplicated file descriptor; no path is needed.
//! let file = std::fs::File::open("/proc/self/fd/42")?;
//! let len = file.metadata()?.len();
//!
//! let mut converter = Converter::new(demuxer, engine);
//! let outcome = converter.convert(
//!     ContainerInput::new(file, len),
//!     std::path::Path::new("/data/cache"),
//!     TargetResolution::new(640, 360),
//! )?;
//! println!("converted file at {}", outcome.output.display());
//! # Ok(())
//! # }
//! ```

pub mod convert;
pub mod io;
pub mod store;

pub use convert::{
    ContainerInput, ConvertConfig, ConvertOutcome, ConvertState, ConvertStats, Converter,
    TargetResolution, OUTPUT_FRAME_RATE,
};
pub use io::{DemuxerSource, FileSink, StoreSink, StoreSource};
pub use store::{FrameStore, FrameStoreReader, FrameStoreWriter};
