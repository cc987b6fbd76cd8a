//! End-to-end conversion tests.
//!
//! Exercises the orchestrator with mock collaborators to verify phase
//! sequencing, error propagation, and cleanup of temporary artifacts.

use revid_codec::{CancelToken, CodecDirection, CodecEngine, CodecInstance, InputSlot, OutputSlot};
use revid_container::{Demuxer, TrackInfo};
use revid_core::{Error, ErrorKind, FormatDescriptor, Result, SlotFlags, Unit};
use revid_pipeline::{ContainerInput, ConvertState, Converter, TargetResolution, OUTPUT_FRAME_RATE};
use std::collections::VecDeque;
use std::io::{Cursor, Read, Seek};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// =============================================================================
// Mock Implementations
// =============================================================================

const CONTAINER_MAGIC: &[u8; 4] = b"mock";
const SAMPLE_LEN: usize = 4;

/// A well-formed mock container: magic bytes plus padding.
fn container_bytes() -> Cursor<Vec<u8>> {
    let mut bytes = CONTAINER_MAGIC.to_vec();
    bytes.resize(64, 0);
    Cursor::new(bytes)
}

/// Mock demuxer over a fixed track table and generated samples.
struct MockDemuxer {
    tracks: Vec<TrackInfo>,
    samples: VecDeque<Unit>,
    selected: Option<usize>,
}

impl MockDemuxer {
    fn new(media_types: &[&str], sample_count: usize) -> Self {
        let tracks = media_types
            .iter()
            .enumerate()
            .map(|(index, mt)| TrackInfo {
                index,
                media_type: mt.to_string(),
                format: FormatDescriptor::video(*mt, 1920, 1080).with_frame_rate(24),
            })
            .collect();
        let samples = (0..sample_count)
            .map(|i| Unit::new(vec![i as u8; SAMPLE_LEN], i as i64 * 33_333))
            .collect();
        Self {
            tracks,
            samples,
            selected: None,
        }
    }
}

impl Demuxer for MockDemuxer {
    fn open<R: Read + Seek + Send + 'static>(&mut self, mut reader: R, len: u64) -> Result<()> {
        if len < CONTAINER_MAGIC.len() as u64 {
            return Err(Error::extractor("container truncated"));
        }
        let mut magic = [0u8; 4];
        reader
            .read_exact(&mut magic)
            .map_err(|err| Error::extractor(format!("unreadable container: {err}")))?;
        if &magic != CONTAINER_MAGIC {
            return Err(Error::extractor("unrecognized container"));
        }
        Ok(())
    }

    fn num_tracks(&self) -> usize {
        self.tracks.len()
    }

    fn track_info(&self, index: usize) -> Option<&TrackInfo> {
        self.tracks.get(index)
    }

    fn select_track(&mut self, index: usize) -> Result<()> {
        self.selected = Some(index);
        Ok(())
    }

    fn next_sample(&mut self) -> Result<Option<Unit>> {
        assert!(self.selected.is_some(), "no track selected");
        Ok(self.samples.pop_front())
    }
}

/// Shared counters observing engine activity across a conversion.
#[derive(Clone, Default)]
struct EngineProbe {
    created: Arc<Mutex<Vec<(CodecDirection, FormatDescriptor)>>>,
    started: Arc<AtomicUsize>,
    stopped: Arc<AtomicUsize>,
}

impl EngineProbe {
    fn created(&self) -> Vec<(CodecDirection, FormatDescriptor)> {
        self.created.lock().unwrap().clone()
    }
}

/// Mock codec engine. Decoders double each payload (compressed samples
/// expand into raw frames), encoders halve it.
#[derive(Clone, Default)]
struct MockEngine {
    probe: EngineProbe,
    stall_decoder: bool,
}

impl MockEngine {
    fn with_probe(probe: EngineProbe) -> Self {
        Self {
            probe,
            stall_decoder: false,
        }
    }
}

impl CodecEngine for MockEngine {
    type Instance = MockCodec;

    fn create_decoder(&self, format: &FormatDescriptor) -> Result<MockCodec> {
        if !matches!(format.mime.as_str(), "video/avc" | "video/hevc") {
            return Err(Error::codec_config(format!(
                "no decoder for {}",
                format.mime
            )));
        }
        self.probe
            .created
            .lock()
            .unwrap()
            .push((CodecDirection::Decode, format.clone()));
        Ok(MockCodec::new(
            CodecDirection::Decode,
            self.stall_decoder,
            self.probe.clone(),
        ))
    }

    fn create_encoder(&self, format: &FormatDescriptor) -> Result<MockCodec> {
        self.probe
            .created
            .lock()
            .unwrap()
            .push((CodecDirection::Encode, format.clone()));
        Ok(MockCodec::new(
            CodecDirection::Encode,
            false,
            self.probe.clone(),
        ))
    }
}

/// Mock codec instance implementing the buffer-queue protocol.
struct MockCodec {
    direction: CodecDirection,
    stalled: bool,
    probe: EngineProbe,
    free_inputs: VecDeque<usize>,
    pending: VecDeque<(Vec<u8>, i64, SlotFlags)>,
    held: Vec<Option<Vec<u8>>>,
    input_eos: bool,
}

impl MockCodec {
    fn new(direction: CodecDirection, stalled: bool, probe: EngineProbe) -> Self {
        Self {
            direction,
            stalled,
            probe,
            free_inputs: (0..2).collect(),
            pending: VecDeque::new(),
            held: vec![None; 4],
            input_eos: false,
        }
    }

    fn transform(&self, payload: &[u8]) -> Vec<u8> {
        match self.direction {
            CodecDirection::Decode => [payload, payload].concat(),
            CodecDirection::Encode => payload[..payload.len() / 2].to_vec(),
        }
    }
}

impl CodecInstance for MockCodec {
    fn direction(&self) -> CodecDirection {
        self.direction
    }

    fn start(&mut self) -> Result<()> {
        self.probe.started.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn dequeue_input(&mut self, _timeout: Duration) -> Result<Option<InputSlot>> {
        if self.stalled {
            return Ok(None);
        }
        Ok(self
            .free_inputs
            .pop_front()
            .map(|index| InputSlot::new(index, 1 << 16)))
    }

    fn queue_input(
        &mut self,
        slot: InputSlot,
        payload: &[u8],
        pts_us: i64,
        flags: SlotFlags,
    ) -> Result<()> {
        if flags.contains(SlotFlags::END_OF_STREAM) {
            self.input_eos = true;
            self.pending
                .push_back((Vec::new(), pts_us, SlotFlags::END_OF_STREAM));
        } else {
            self.pending
                .push_back((self.transform(payload), pts_us, SlotFlags::empty()));
        }
        self.free_inputs.push_back(slot.index());
        Ok(())
    }

    fn dequeue_output(&mut self, _timeout: Duration) -> Result<Option<OutputSlot>> {
        if self.stalled {
            return Ok(None);
        }
        let Some((payload, pts_us, flags)) = self.pending.pop_front() else {
            return Ok(None);
        };
        if flags.contains(SlotFlags::END_OF_STREAM) {
            assert!(self.input_eos, "output end-of-stream before input end-of-stream");
        }
        let index = self
            .held
            .iter()
            .position(Option::is_none)
            .expect("output slots exhausted");
        self.held[index] = Some(payload);
        Ok(Some(OutputSlot::new(index, pts_us, flags)))
    }

    fn output_data(&self, slot: &OutputSlot) -> Result<&[u8]> {
        Ok(self.held[slot.index()].as_deref().expect("slot not held"))
    }

    fn release_output(&mut self, slot: OutputSlot) -> Result<()> {
        self.held[slot.index()] = None;
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.probe.stopped.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn frame_cache_is_clean(cache_dir: &std::path::Path) -> bool {
    let dir = cache_dir.join("frame-cache");
    match std::fs::read_dir(&dir) {
        Ok(entries) => entries.count() == 0,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => true,
        Err(err) => panic!("cannot inspect {}: {err}", dir.display()),
    }
}

fn output_dir_is_clean(cache_dir: &std::path::Path) -> bool {
    let dir = cache_dir.join("converted");
    match std::fs::read_dir(&dir) {
        Ok(entries) => entries.count() == 0,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => true,
        Err(err) => panic!("cannot inspect {}: {err}", dir.display()),
    }
}

// =============================================================================
// Success Path (Scenario A)
// =============================================================================

#[test]
fn test_convert_reports_target_resolution() {
    let cache = tempfile::TempDir::new().unwrap();
    let demuxer = MockDemuxer::new(&["audio/mp4a-latm", "video/avc"], 10);
    let probe = EngineProbe::default();
    let mut converter = Converter::new(demuxer, MockEngine::with_probe(probe.clone()));

    let outcome = converter
        .convert(
            ContainerInput::new(container_bytes(), 64),
            cache.path(),
            TargetResolution::new(640, 360),
        )
        .unwrap();

    assert_eq!(outcome.width, 640);
    assert_eq!(outcome.height, 360);
    assert_eq!(converter.state(), ConvertState::Completed);

    let written = std::fs::read(&outcome.output).unwrap();
    assert!(!written.is_empty());
    // Decode doubles each 4-byte sample, encode halves it back: the output
    // is the sample payloads in order.
    let expected: Vec<u8> = (0..10u8).flat_map(|i| vec![i; SAMPLE_LEN]).collect();
    assert_eq!(written, expected);
    assert_eq!(outcome.stats.frames_decoded, 10);
    assert_eq!(outcome.stats.frames_encoded, 10);
    assert_eq!(outcome.stats.output_bytes, expected.len() as u64);
}

#[test]
fn test_convert_removes_intermediate_store_on_success() {
    let cache = tempfile::TempDir::new().unwrap();
    let demuxer = MockDemuxer::new(&["video/avc"], 5);
    let mut converter = Converter::new(demuxer, MockEngine::default());

    converter
        .convert(
            ContainerInput::new(container_bytes(), 64),
            cache.path(),
            TargetResolution::new(320, 240),
        )
        .unwrap();

    assert!(frame_cache_is_clean(cache.path()));
    assert!(!output_dir_is_clean(cache.path()));
}

#[test]
fn test_encoder_configured_for_target_format() {
    let cache = tempfile::TempDir::new().unwrap();
    let demuxer = MockDemuxer::new(&["video/hevc"], 3);
    let probe = EngineProbe::default();
    let mut converter = Converter::new(demuxer, MockEngine::with_probe(probe.clone()));

    converter
        .convert(
            ContainerInput::new(container_bytes(), 64),
            cache.path(),
            TargetResolution::new(640, 360),
        )
        .unwrap();

    let created = probe.created();
    assert_eq!(created.len(), 2);
    assert_eq!(created[0].0, CodecDirection::Decode);
    assert_eq!(created[0].1.mime, "video/hevc");
    let (direction, encoder_format) = &created[1];
    assert_eq!(*direction, CodecDirection::Encode);
    assert_eq!(encoder_format.mime, "video/avc");
    assert_eq!(encoder_format.width, 640);
    assert_eq!(encoder_format.height, 360);
    assert_eq!(encoder_format.frame_rate, Some(OUTPUT_FRAME_RATE));
}

#[test]
fn test_every_started_codec_is_stopped() {
    let cache = tempfile::TempDir::new().unwrap();
    let demuxer = MockDemuxer::new(&["video/avc"], 4);
    let probe = EngineProbe::default();
    let mut converter = Converter::new(demuxer, MockEngine::with_probe(probe.clone()));

    converter
        .convert(
            ContainerInput::new(container_bytes(), 64),
            cache.path(),
            TargetResolution::new(320, 240),
        )
        .unwrap();

    assert_eq!(probe.started.load(Ordering::SeqCst), 2);
    assert_eq!(probe.stopped.load(Ordering::SeqCst), 2);
}

// =============================================================================
// Malformed Container (Scenario B)
// =============================================================================

#[test]
fn test_truncated_container_fails_without_artifacts() {
    let cache = tempfile::TempDir::new().unwrap();
    let demuxer = MockDemuxer::new(&["video/avc"], 5);
    let mut converter = Converter::new(demuxer, MockEngine::default());

    let err = converter
        .convert(
            ContainerInput::new(Cursor::new(Vec::new()), 0),
            cache.path(),
            TargetResolution::new(640, 360),
        )
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Extractor);
    assert_eq!(converter.state(), ConvertState::Failed(ErrorKind::Extractor));
    assert!(frame_cache_is_clean(cache.path()));
    assert!(output_dir_is_clean(cache.path()));
}

// =============================================================================
// Audio-Only Container (Scenario C)
// =============================================================================

#[test]
fn test_audio_only_container_creates_no_codec() {
    let cache = tempfile::TempDir::new().unwrap();
    let demuxer = MockDemuxer::new(&["audio/mp4a-latm", "audio/opus"], 0);
    let probe = EngineProbe::default();
    let mut converter = Converter::new(demuxer, MockEngine::with_probe(probe.clone()));

    let err = converter
        .convert(
            ContainerInput::new(container_bytes(), 64),
            cache.path(),
            TargetResolution::new(640, 360),
        )
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NoVideoTrack);
    assert_eq!(
        converter.state(),
        ConvertState::Failed(ErrorKind::NoVideoTrack)
    );
    assert!(probe.created().is_empty());
    assert!(frame_cache_is_clean(cache.path()));
    assert!(output_dir_is_clean(cache.path()));
}

// =============================================================================
// Unsupported Video Format (Scenario D)
// =============================================================================

#[test]
fn test_unsupported_mime_surfaces_codec_config_failure() {
    let cache = tempfile::TempDir::new().unwrap();
    let demuxer = MockDemuxer::new(&["video/exotic"], 5);
    let probe = EngineProbe::default();
    let mut converter = Converter::new(demuxer, MockEngine::with_probe(probe.clone()));

    let err = converter
        .convert(
            ContainerInput::new(container_bytes(), 64),
            cache.path(),
            TargetResolution::new(640, 360),
        )
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::CodecConfig);
    assert_eq!(
        converter.state(),
        ConvertState::Failed(ErrorKind::CodecConfig)
    );
    // Nothing was started, so nothing needed stopping.
    assert_eq!(probe.started.load(Ordering::SeqCst), 0);
    assert!(frame_cache_is_clean(cache.path()));
    assert!(output_dir_is_clean(cache.path()));
}

// =============================================================================
// Stall and Cancellation
// =============================================================================

#[test]
fn test_stalled_decoder_surfaces_pump_stall() {
    let cache = tempfile::TempDir::new().unwrap();
    let demuxer = MockDemuxer::new(&["video/avc"], 5);
    let probe = EngineProbe::default();
    let engine = MockEngine {
        probe: probe.clone(),
        stall_decoder: true,
    };
    let mut converter = Converter::new(demuxer, engine);

    let err = converter
        .convert(
            ContainerInput::new(container_bytes(), 64),
            cache.path(),
            TargetResolution::new(640, 360),
        )
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::PumpStall);
    assert_eq!(converter.state(), ConvertState::Failed(ErrorKind::PumpStall));
    // The stalled decoder was still stopped during cleanup.
    assert_eq!(probe.started.load(Ordering::SeqCst), 1);
    assert_eq!(probe.stopped.load(Ordering::SeqCst), 1);
    assert!(frame_cache_is_clean(cache.path()));
    assert!(output_dir_is_clean(cache.path()));
}

#[test]
fn test_cancellation_aborts_into_failed_state() {
    let cache = tempfile::TempDir::new().unwrap();
    let demuxer = MockDemuxer::new(&["video/avc"], 5);
    let cancel = CancelToken::new();
    cancel.cancel();
    let mut converter =
        Converter::new(demuxer, MockEngine::default()).with_cancel(cancel);

    let err = converter
        .convert(
            ContainerInput::new(container_bytes(), 64),
            cache.path(),
            TargetResolution::new(640, 360),
        )
        .unwrap_err();

    assert!(err.is_cancelled());
    assert_eq!(converter.state(), ConvertState::Failed(ErrorKind::Cancelled));
    assert!(frame_cache_is_clean(cache.path()));
    assert!(output_dir_is_clean(cache.path()));
}

// =============================================================================
// Parameter Validation
// =============================================================================

#[test]
fn test_zero_resolution_rejected_before_any_work() {
    let cache = tempfile::TempDir::new().unwrap();
    let demuxer = MockDemuxer::new(&["video/avc"], 5);
    let probe = EngineProbe::default();
    let mut converter = Converter::new(demuxer, MockEngine::with_probe(probe.clone()));

    let err = converter
        .convert(
            ContainerInput::new(container_bytes(), 64),
            cache.path(),
            TargetResolution::new(0, 0),
        )
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InvalidParameter);
    assert!(probe.created().is_empty());
    assert!(frame_cache_is_clean(cache.path()));
}
