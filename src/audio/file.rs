//! Raw PCM file collaborator
//!
//! The input is headerless interleaved 16-bit signed little-endian stereo
//! PCM. The pipeline only needs the total size and positioned byte reads;
//! a short read at end-of-file is a normal outcome, not an error.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use crate::error::Result;

/// Byte-addressable source of PCM sample data.
pub trait SampleSource: Send {
    /// Total length of the stream in bytes.
    fn len_bytes(&self) -> u64;

    /// Read up to `buf.len()` bytes starting at `offset`.
    ///
    /// Returns the number of bytes actually read; short counts occur only
    /// at end-of-file.
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<usize>;
}

/// On-disk raw PCM file.
pub struct PcmFile {
    file: File,
    len_bytes: u64,
}

impl PcmFile {
    /// Open a raw PCM file for streaming.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let len_bytes = file.metadata()?.len();
        Ok(Self { file, len_bytes })
    }
}

impl SampleSource for PcmFile {
    fn len_bytes(&self) -> u64 {
        self.len_bytes
    }

    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        self.file.seek(SeekFrom::Start(offset))?;

        let mut filled = 0;
        while filled < buf.len() {
            let n = self.file.read(&mut buf[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        Ok(filled)
    }
}
