//! Pump source and sink adapters.
//!
//! The decode pump reads from the demuxer and writes into the frame store;
//! the encode pump reads the frame store back and writes the output file.

use crate::store::{FrameStoreReader, FrameStoreWriter};
use revid_codec::{UnitSink, UnitSource};
use revid_container::Demuxer;
use revid_core::{Result, Unit};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Compressed samples of the selected track, as a pump source.
pub struct DemuxerSource<'a, D: Demuxer> {
    demuxer: &'a mut D,
}

impl<'a, D: Demuxer> DemuxerSource<'a, D> {
    /// Wrap a demuxer whose video track has been selected.
    pub fn new(demuxer: &'a mut D) -> Self {
        Self { demuxer }
    }
}

impl<D: Demuxer> UnitSource for DemuxerSource<'_, D> {
    fn next_unit(&mut self) -> Result<Option<Unit>> {
        self.demuxer.next_sample()
    }
}

/// Frame store writer as a pump sink.
pub struct StoreSink<'a> {
    writer: &'a mut FrameStoreWriter,
}

impl<'a> StoreSink<'a> {
    /// Wrap a store writer.
    pub fn new(writer: &'a mut FrameStoreWriter) -> Self {
        Self { writer }
    }
}

impl UnitSink for StoreSink<'_> {
    fn write_unit(&mut self, data: &[u8], pts_us: i64, eos: bool) -> Result<()> {
        if eos {
            self.writer.append_eos(pts_us)?;
        } else {
            self.writer.append(data, pts_us)?;
        }
        Ok(())
    }
}

/// Frame store reader as a pump source.
///
/// Yields the stored frames in append order and stops at the terminal
/// end-of-stream record: the encode pump signals its own end-of-stream to
/// the encoder when this source is exhausted.
pub struct StoreSource {
    reader: FrameStoreReader,
    done: bool,
}

impl StoreSource {
    /// Wrap a store reader.
    pub fn new(reader: FrameStoreReader) -> Self {
        Self {
            reader,
            done: false,
        }
    }
}

impl UnitSource for StoreSource {
    fn next_unit(&mut self) -> Result<Option<Unit>> {
        if self.done {
            return Ok(None);
        }
        match self.reader.next_frame()? {
            Some((record, _)) if record.is_eos() => {
                self.done = true;
                Ok(None)
            }
            Some((record, bytes)) => Ok(Some(Unit::new(bytes, record.pts_us))),
            None => {
                self.done = true;
                Ok(None)
            }
        }
    }
}

/// Buffered output-file writer as a pump sink.
pub struct FileSink {
    writer: BufWriter<File>,
    bytes_written: u64,
}

impl FileSink {
    /// Create the output file, truncating any previous contents.
    pub fn create(path: &Path) -> Result<Self> {
        Ok(Self {
            writer: BufWriter::new(File::create(path)?),
            bytes_written: 0,
        })
    }

    /// Flush and close the file, returning the number of bytes written.
    pub fn finish(mut self) -> Result<u64> {
        self.writer.flush()?;
        Ok(self.bytes_written)
    }
}

impl UnitSink for FileSink {
    fn write_unit(&mut self, data: &[u8], _pts_us: i64, _eos: bool) -> Result<()> {
        self.writer.write_all(data)?;
        self.bytes_written += data.len() as u64;
        Ok(())
    }
}
