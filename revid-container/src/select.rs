//! Track classification and video track selection.

use crate::traits::{Demuxer, TrackInfo};
use revid_core::{format::VIDEO_MIME_PREFIX, Error, FormatDescriptor, Result};
use tracing::debug;

/// Classification of a container track.
///
/// Tracks form a closed set of kinds; selection filters on [`Video`]
/// rather than re-inspecting media-type strings at each use site.
///
/// [`Video`]: TrackKind::Video
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackKind {
    /// A video elementary stream.
    Video,
    /// An audio elementary stream.
    Audio,
    /// Anything else (subtitles, metadata, unknown).
    Other,
}

impl TrackKind {
    /// Classify a media-type string.
    pub fn of(media_type: &str) -> Self {
        if media_type.starts_with(VIDEO_MIME_PREFIX) {
            TrackKind::Video
        } else if media_type.starts_with("audio/") {
            TrackKind::Audio
        } else {
            TrackKind::Other
        }
    }
}

/// The video track chosen for a conversion.
#[derive(Debug, Clone)]
pub struct SelectedTrack {
    /// Track index within the container.
    pub index: usize,
    /// The track's native format, used to configure the decoder.
    pub format: FormatDescriptor,
}

/// Pick the first video track of a demultiplexed container.
///
/// Tracks are inspected in container order; the first one classified
/// [`TrackKind::Video`] wins. Fails with [`Error::NoVideoTrack`] when no
/// track qualifies — reported to the caller, never fatal to the process.
pub fn select_video_track<D: Demuxer>(demuxer: &D) -> Result<SelectedTrack> {
    for index in 0..demuxer.num_tracks() {
        let Some(info) = demuxer.track_info(index) else {
            continue;
        };
        if TrackKind::of(&info.media_type) == TrackKind::Video {
            debug!(index, media_type = %info.media_type, "video track selected");
            return Ok(SelectedTrack {
                index,
                format: info.format.clone(),
            });
        }
    }
    Err(Error::NoVideoTrack)
}

#[cfg(test)]
mod tests {
    use super::*;
    use revid_core::{ErrorKind, Unit};
    use std::io::{Read, Seek};

    struct FixedTracks {
        tracks: Vec<TrackInfo>,
    }

    impl FixedTracks {
        fn new(media_types: &[&str]) -> Self {
            let tracks = media_types
                .iter()
                .enumerate()
                .map(|(index, mt)| TrackInfo {
                    index,
                    media_type: mt.to_string(),
                    format: FormatDescriptor::video(*mt, 1920, 1080),
                })
                .collect();
            Self { tracks }
        }
    }

    impl Demuxer for FixedTracks {
        fn open<R: Read + Seek + Send + 'static>(&mut self, _reader: R, _len: u64) -> Result<()> {
            Ok(())
        }

        fn num_tracks(&self) -> usize {
            self.tracks.len()
        }

        fn track_info(&self, index: usize) -> Option<&TrackInfo> {
            self.tracks.get(index)
        }

        fn select_track(&mut self, _index: usize) -> Result<()> {
            Ok(())
        }

        fn next_sample(&mut self) -> Result<Option<Unit>> {
            Ok(None)
        }
    }

    #[test]
    fn test_classification() {
        assert_eq!(TrackKind::of("video/avc"), TrackKind::Video);
        assert_eq!(TrackKind::of("video/hevc"), TrackKind::Video);
        assert_eq!(TrackKind::of("audio/mp4a-latm"), TrackKind::Audio);
        assert_eq!(TrackKind::of("text/vtt"), TrackKind::Other);
    }

    #[test]
    fn test_selects_first_video_track() {
        let demuxer = FixedTracks::new(&["audio/mp4a-latm", "video/avc", "video/hevc"]);
        let selected = select_video_track(&demuxer).unwrap();
        assert_eq!(selected.index, 1);
        assert_eq!(selected.format.mime, "video/avc");
    }

    #[test]
    fn test_audio_only_container() {
        let demuxer = FixedTracks::new(&["audio/mp4a-latm", "audio/opus"]);
        let err = select_video_track(&demuxer).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoVideoTrack);
    }

    #[test]
    fn test_empty_container() {
        let demuxer = FixedTracks::new(&[]);
        assert!(select_video_track(&demuxer).is_err());
    }
}
