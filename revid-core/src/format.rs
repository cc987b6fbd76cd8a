//! Stream format descriptors.

use std::fmt;

/// MIME type of an H.264/AVC elementary stream.
pub const MIME_H264: &str = "video/avc";

/// Media-type prefix shared by all video tracks.
pub const VIDEO_MIME_PREFIX: &str = "video/";

/// Describes the format of one elementary stream.
///
/// A descriptor is bound to exactly one codec instance when that instance is
/// configured; the decode side uses the selected track's native descriptor,
/// the encode side a caller-derived target descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatDescriptor {
    /// MIME type string, e.g. `video/avc`.
    pub mime: String,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Frames per second, if known.
    pub frame_rate: Option<u32>,
    /// Codec-specific configuration data (e.g. SPS/PPS for H.264).
    pub codec_data: Option<Vec<u8>>,
}

impl FormatDescriptor {
    /// Create a video format descriptor.
    pub fn video(mime: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            mime: mime.into(),
            width,
            height,
            frame_rate: None,
            codec_data: None,
        }
    }

    /// Set the frame rate.
    pub fn with_frame_rate(mut self, frame_rate: u32) -> Self {
        self.frame_rate = Some(frame_rate);
        self
    }

    /// Attach codec-specific configuration data.
    pub fn with_codec_data(mut self, data: Vec<u8>) -> Self {
        self.codec_data = Some(data);
        self
    }

    /// Check whether this descriptor describes a video stream.
    pub fn is_video(&self) -> bool {
        self.mime.starts_with(VIDEO_MIME_PREFIX)
    }
}

impl fmt::Display for FormatDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}x{}", self.mime, self.width, self.height)?;
        if let Some(rate) = self.frame_rate {
            write!(f, "@{}fps", rate)?;
        }
        Ok(())
    }
}
