//! The conversion orchestrator.
//!
//! Sequences track selection, the decode phase, the encode phase, cleanup,
//! and result reporting. The decode phase runs to full completion before
//! the encode phase begins.

use crate::io::{DemuxerSource, FileSink, StoreSink, StoreSource};
use crate::store::FrameStore;
use revid_codec::{
    CancelToken, CodecEngine, CodecInstance, CodecPump, DrainPolicy, PumpConfig, PumpStats,
    UnitSink, UnitSource,
};
use revid_container::{select_video_track, Demuxer, SelectedTrack};
use revid_core::{format::MIME_H264, Error, ErrorKind, FormatDescriptor, Result};
use std::fs;
use std::io::{Read, Seek};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Output frame rate, fixed in this version.
pub const OUTPUT_FRAME_RATE: u32 = 30;

/// Cache subdirectory holding intermediate frame stores.
const FRAME_CACHE_DIR: &str = "frame-cache";
/// Cache subdirectory holding converted output files.
const OUTPUT_DIR: &str = "converted";

/// An open container handle and its byte extent.
///
/// The reader is typically a `File` duplicated from a host-owned file
/// descriptor; the storage permission model may forbid resolving it to a
/// path, so none is ever asked for.
#[derive(Debug)]
pub struct ContainerInput<R> {
    /// Readable, seekable handle positioned anywhere.
    pub reader: R,
    /// Total byte extent of the container.
    pub len: u64,
}

impl<R> ContainerInput<R> {
    /// Wrap a reader and its byte extent.
    pub fn new(reader: R, len: u64) -> Self {
        Self { reader, len }
    }
}

/// Requested output resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetResolution {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
}

impl TargetResolution {
    /// Create a target resolution.
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    fn validate(self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::invalid_param(format!(
                "target resolution {}x{} must be non-zero",
                self.width, self.height
            )));
        }
        Ok(())
    }
}

/// Orchestrator state.
///
/// `Completed` and `Failed` are terminal; `Failed` is reachable from every
/// non-terminal state and no transition skips a state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvertState {
    /// No conversion started.
    Idle,
    /// The video track has been selected.
    TrackSelected,
    /// The decode pump is running.
    Decoding,
    /// The frame store is fully populated.
    Decoded,
    /// The encode pump is running.
    Encoding,
    /// The output file is complete and the store removed.
    Completed,
    /// The conversion failed.
    Failed(ErrorKind),
}

/// Orchestrator configuration.
#[derive(Debug, Clone)]
pub struct ConvertConfig {
    /// Bound on each buffer-slot acquisition wait.
    pub slot_timeout: Duration,
    /// Liveness budget for each pump.
    pub max_idle_iterations: u32,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        let pump = PumpConfig::default();
        Self {
            slot_timeout: pump.slot_timeout,
            max_idle_iterations: pump.max_idle_iterations,
        }
    }
}

impl ConvertConfig {
    fn pump_config(&self, drain: DrainPolicy) -> PumpConfig {
        PumpConfig {
            slot_timeout: self.slot_timeout,
            max_idle_iterations: self.max_idle_iterations,
            drain,
        }
    }
}

/// Conversion statistics.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConvertStats {
    /// Frames produced by the decode phase.
    pub frames_decoded: u64,
    /// Compressed units produced by the encode phase.
    pub frames_encoded: u64,
    /// Bytes held in the intermediate store at its peak.
    pub intermediate_bytes: u64,
    /// Bytes in the output file.
    pub output_bytes: u64,
}

/// A successful conversion result.
#[derive(Debug, Clone)]
pub struct ConvertOutcome {
    /// Location of the produced file.
    pub output: PathBuf,
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Conversion statistics.
    pub stats: ConvertStats,
}

/// Converts one container's video track to H.264/AVC at a target
/// resolution.
pub struct Converter<D, E> {
    demuxer: D,
    engine: E,
    config: ConvertConfig,
    cancel: CancelToken,
    state: ConvertState,
}

impl<D: Demuxer, E: CodecEngine> Converter<D, E> {
    /// Create a converter over a demuxer and a codec engine.
    pub fn new(demuxer: D, engine: E) -> Self {
        Self {
            demuxer,
            engine,
            config: ConvertConfig::default(),
            cancel: CancelToken::new(),
            state: ConvertState::Idle,
        }
    }

    /// Set the configuration.
    pub fn with_config(mut self, config: ConvertConfig) -> Self {
        self.config = config;
        self
    }

    /// Attach a cancellation token, observed at every pump iteration.
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Get the current state.
    pub fn state(&self) -> ConvertState {
        self.state
    }

    /// Convert the container's first video track.
    ///
    /// On success the intermediate store has been removed and the returned
    /// location points at the finished file. On failure the error is
    /// returned as a typed result, every started codec instance has been
    /// stopped, and no intermediate or partial output file is left behind.
    pub fn convert<R: Read + Seek + Send + 'static>(
        &mut self,
        input: ContainerInput<R>,
        cache_dir: &Path,
        target: TargetResolution,
    ) -> Result<ConvertOutcome> {
        self.state = ConvertState::Idle;
        match self.run(input, cache_dir, target) {
            Ok(outcome) => {
                self.state = ConvertState::Completed;
                Ok(outcome)
            }
            Err(err) => {
                self.state = ConvertState::Failed(err.kind());
                Err(err)
            }
        }
    }

    fn run<R: Read + Seek + Send + 'static>(
        &mut self,
        input: ContainerInput<R>,
        cache_dir: &Path,
        target: TargetResolution,
    ) -> Result<ConvertOutcome> {
        target.validate()?;

        self.demuxer.open(input.reader, input.len)?;
        let track = select_video_track(&self.demuxer)?;
        self.state = ConvertState::TrackSelected;
        self.demuxer.select_track(track.index)?;
        info!(index = track.index, format = %track.format, "track selected");

        let token = Uuid::new_v4();
        let store = FrameStore::create(&cache_dir.join(FRAME_CACHE_DIR), &token.to_string())?;
        let output_dir = cache_dir.join(OUTPUT_DIR);
        fs::create_dir_all(&output_dir)?;
        let output_path = output_dir.join(format!("{token}.mp4"));

        let result = self.run_phases(&track, &store, &output_path, target);

        // The store is removed on success and on failure alike.
        if let Err(err) = store.remove() {
            warn!(error = %err, "failed to remove intermediate store");
        }

        match result {
            Ok(stats) => {
                info!(output = %output_path.display(), bytes = stats.output_bytes, "conversion complete");
                Ok(ConvertOutcome {
                    output: output_path,
                    width: target.width,
                    height: target.height,
                    stats,
                })
            }
            Err(err) => {
                remove_partial_output(&output_path);
                Err(err)
            }
        }
    }

    fn run_phases(
        &mut self,
        track: &SelectedTrack,
        store: &FrameStore,
        output_path: &Path,
        target: TargetResolution,
    ) -> Result<ConvertStats> {
        // Decode phase: container -> frame store.
        self.state = ConvertState::Decoding;
        info!(format = %track.format, "decode phase starting");
        let mut decoder = self.engine.create_decoder(&track.format)?;
        let decode_pump = CodecPump::new(self.config.pump_config(DrainPolicy::DrainAll))
            .with_cancel(self.cancel.clone());

        let mut writer = store.writer()?;
        let decode_stats = {
            let mut source = DemuxerSource::new(&mut self.demuxer);
            let mut sink = StoreSink::new(&mut writer);
            run_codec(&decode_pump, &mut decoder, &mut source, &mut sink)?
        };
        writer.finish()?;
        self.state = ConvertState::Decoded;
        debug!(
            frames = decode_stats.units_drained,
            bytes = decode_stats.bytes_drained,
            "decode phase complete"
        );

        // Encode phase: frame store -> output file.
        self.state = ConvertState::Encoding;
        let target_format = FormatDescriptor::video(MIME_H264, target.width, target.height)
            .with_frame_rate(OUTPUT_FRAME_RATE);
        info!(format = %target_format, "encode phase starting");
        let mut encoder = self.engine.create_encoder(&target_format)?;
        let encode_pump = CodecPump::new(self.config.pump_config(DrainPolicy::Single))
            .with_cancel(self.cancel.clone());

        let mut source = StoreSource::new(store.reader()?);
        let mut sink = FileSink::create(output_path)?;
        let encode_stats = run_codec(&encode_pump, &mut encoder, &mut source, &mut sink)?;
        let output_bytes = sink.finish()?;
        debug!(
            frames = encode_stats.units_drained,
            bytes = output_bytes,
            "encode phase complete"
        );

        Ok(ConvertStats {
            frames_decoded: decode_stats.units_drained.saturating_sub(1),
            frames_encoded: encode_stats.units_drained.saturating_sub(1),
            intermediate_bytes: decode_stats.bytes_drained,
            output_bytes,
        })
    }
}

/// Run one pump over a codec instance, stopping the instance on every exit
/// path. A stop failure after a successful run is surfaced; a stop failure
/// after a failed run is logged so the run error wins.
fn run_codec<C, S, K>(
    pump: &CodecPump,
    codec: &mut C,
    source: &mut S,
    sink: &mut K,
) -> Result<PumpStats>
where
    C: CodecInstance,
    S: UnitSource,
    K: UnitSink,
{
    codec.start()?;
    let result = pump.run(codec, source, sink);
    let stop_result = codec.stop();
    match result {
        Ok(stats) => {
            stop_result?;
            Ok(stats)
        }
        Err(err) => {
            if let Err(stop_err) = stop_result {
                warn!(error = %stop_err, "codec stop failed during error cleanup");
            }
            Err(err)
        }
    }
}

fn remove_partial_output(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => debug!(path = %path.display(), "partial output removed"),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => warn!(error = %err, "failed to remove partial output"),
    }
}
