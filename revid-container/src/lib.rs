//! # Revid Container
//!
//! The container demultiplexer seam and the track selector.
//!
//! Demultiplexing is an external capability: this crate defines the
//! [`Demuxer`] trait a container reader must expose (track enumeration,
//! per-track format descriptors, sequential sample reads with timestamps)
//! and the selection logic that picks the video elementary stream.

pub mod select;
pub mod traits;

pub use select::{select_video_track, SelectedTrack, TrackKind};
pub use traits::{Demuxer, TrackInfo};
