//! The intermediate frame store.
//!
//! Raw decoded frames are held between the decode and encode phases as two
//! files: an append-only data file of frame bytes and a sidecar index of
//! [`FrameRecord`]s describing how to re-slice them. The sidecar is
//! mandatory — raw frame bytes carry no structure of their own and must
//! never be fed back through a container reader.
//!
//! The store is written exactly once by the decode pump, read exactly once
//! and sequentially by the encode pump, and removed by the orchestrator
//! after either terminal outcome.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use revid_core::{Error, FrameRecord, Result};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Magic bytes at the start of the sidecar index.
const INDEX_MAGIC: &[u8; 4] = b"RVFS";
/// Sidecar format version.
const INDEX_VERSION: u32 = 1;

/// Paths of one intermediate store.
#[derive(Debug, Clone)]
pub struct FrameStore {
    data_path: PathBuf,
    index_path: PathBuf,
}

impl FrameStore {
    /// Lay out a store named by `token` under `dir`, creating `dir` if
    /// needed. No files are created until a writer is opened.
    pub fn create(dir: &Path, token: &str) -> Result<Self> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            data_path: dir.join(format!("{token}.raw")),
            index_path: dir.join(format!("{token}.idx")),
        })
    }

    /// Path of the raw data file.
    pub fn data_path(&self) -> &Path {
        &self.data_path
    }

    /// Path of the sidecar index file.
    pub fn index_path(&self) -> &Path {
        &self.index_path
    }

    /// Open the store for writing. Truncates any previous contents.
    pub fn writer(&self) -> Result<FrameStoreWriter> {
        FrameStoreWriter::create(self)
    }

    /// Open the store for one sequential read pass.
    pub fn reader(&self) -> Result<FrameStoreReader> {
        FrameStoreReader::open(self)
    }

    /// Remove both store files. Missing files are not an error, so removal
    /// is safe on paths where the store was never populated.
    pub fn remove(&self) -> Result<()> {
        for path in [&self.data_path, &self.index_path] {
            match fs::remove_file(path) {
                Ok(()) => {}
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(err) => return Err(err.into()),
            }
        }
        debug!(data = %self.data_path.display(), "intermediate store removed");
        Ok(())
    }
}

/// Appends raw frames and their records to a store.
pub struct FrameStoreWriter {
    data: BufWriter<File>,
    index: BufWriter<File>,
    offset: u64,
    last_pts: Option<i64>,
    records: u64,
}

impl FrameStoreWriter {
    fn create(store: &FrameStore) -> Result<Self> {
        let data = BufWriter::new(File::create(&store.data_path)?);
        let mut index = BufWriter::new(File::create(&store.index_path)?);
        index.write_all(INDEX_MAGIC)?;
        index.write_u32::<LittleEndian>(INDEX_VERSION)?;
        Ok(Self {
            data,
            index,
            offset: 0,
            last_pts: None,
            records: 0,
        })
    }

    /// Append one frame, returning its record.
    ///
    /// Presentation timestamps must be non-decreasing in append order.
    pub fn append(&mut self, bytes: &[u8], pts_us: i64) -> Result<FrameRecord> {
        self.check_monotonic(pts_us)?;
        let record = FrameRecord::new(self.offset, bytes.len() as u64, pts_us);
        self.data.write_all(bytes)?;
        self.push_record(record)?;
        Ok(record)
    }

    /// Append the terminal end-of-stream record.
    pub fn append_eos(&mut self, pts_us: i64) -> Result<FrameRecord> {
        self.check_monotonic(pts_us)?;
        let record = FrameRecord::end_of_stream(self.offset, pts_us);
        self.push_record(record)?;
        Ok(record)
    }

    /// Number of records appended so far.
    pub fn records(&self) -> u64 {
        self.records
    }

    /// Flush both files and close the writer.
    pub fn finish(mut self) -> Result<()> {
        self.data.flush()?;
        self.index.flush()?;
        debug!(records = self.records, bytes = self.offset, "store populated");
        Ok(())
    }

    fn check_monotonic(&self, pts_us: i64) -> Result<()> {
        if let Some(last) = self.last_pts {
            if pts_us < last {
                return Err(Error::invalid_param(format!(
                    "non-monotonic presentation timestamp: {pts_us} after {last}"
                )));
            }
        }
        Ok(())
    }

    fn push_record(&mut self, record: FrameRecord) -> Result<()> {
        record.write_to(&mut self.index)?;
        self.offset += record.len;
        self.last_pts = Some(record.pts_us);
        self.records += 1;
        Ok(())
    }
}

/// Reads a store back, yielding records and frame bytes in append order.
pub struct FrameStoreReader {
    data: BufReader<File>,
    index: BufReader<File>,
    offset: u64,
}

impl FrameStoreReader {
    fn open(store: &FrameStore) -> Result<Self> {
        let data = BufReader::new(File::open(&store.data_path)?);
        let mut index = BufReader::new(File::open(&store.index_path)?);

        let mut magic = [0u8; 4];
        index.read_exact(&mut magic)?;
        if &magic != INDEX_MAGIC {
            return Err(Error::invalid_param("not a frame store index"));
        }
        let version = index.read_u32::<LittleEndian>()?;
        if version != INDEX_VERSION {
            return Err(Error::invalid_param(format!(
                "unsupported frame store version {version}"
            )));
        }

        Ok(Self {
            data,
            index,
            offset: 0,
        })
    }

    /// Read the next record and its frame bytes, or `None` past the last
    /// record.
    pub fn next_frame(&mut self) -> Result<Option<(FrameRecord, Vec<u8>)>> {
        let mut header = [0u8; FrameRecord::ENCODED_LEN];
        match self.index.read_exact(&mut header) {
            Ok(()) => {}
            Err(err) if err.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(err) => return Err(err.into()),
        }
        let record = FrameRecord::read_from(&mut header.as_slice())?;
        if record.offset != self.offset {
            return Err(Error::invalid_param(format!(
                "frame record offset {} does not match read position {}",
                record.offset, self.offset
            )));
        }

        let mut bytes = vec![0u8; record.len as usize];
        self.data.read_exact(&mut bytes)?;
        self.offset += record.len;
        Ok(Some((record, bytes)))
    }
}
