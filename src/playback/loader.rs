//! Chunk loader
//!
//! Consumes the file collaborator one chunk of bytes at a time, decoding
//! little-endian sample pairs into the current input chunk. Running the
//! filter over the loaded chunk is the engine's job.

use tracing::debug;

use crate::audio::file::SampleSource;
use crate::audio::types::{Sample, BYTES_PER_SAMPLE};
use crate::error::Result;

/// Fills the current input chunk from a byte source, tracking the offset.
pub struct ChunkLoader<S: SampleSource> {
    source: S,
    offset: u64,
    scratch: Vec<u8>,
}

impl<S: SampleSource> ChunkLoader<S> {
    pub fn new(source: S, chunk_samples: usize) -> Self {
        Self {
            source,
            offset: 0,
            scratch: vec![0u8; chunk_samples * BYTES_PER_SAMPLE],
        }
    }

    /// Fill `curr_in` with the next chunk of samples.
    ///
    /// Returns false, reading nothing, once the offset has reached
    /// end-of-file. A short read near the end is tolerated; the unfilled
    /// tail of the chunk is zeroed.
    pub fn load(&mut self, curr_in: &mut [Sample]) -> Result<bool> {
        if self.offset >= self.source.len_bytes() {
            debug!("end of stream at offset {}", self.offset);
            return Ok(false);
        }

        let want = curr_in.len() * BYTES_PER_SAMPLE;
        let got = self.source.read_at(self.offset, &mut self.scratch[..want])?;
        self.offset += want as u64;

        let samples = got / BYTES_PER_SAMPLE;
        for (i, out) in curr_in.iter_mut().take(samples).enumerate() {
            *out = Sample::from_le_bytes([self.scratch[2 * i], self.scratch[2 * i + 1]]);
        }
        curr_in[samples..].fill(0);

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;

    struct MemorySource(Vec<u8>);

    impl SampleSource for MemorySource {
        fn len_bytes(&self) -> u64 {
            self.0.len() as u64
        }

        fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<usize> {
            let start = (offset as usize).min(self.0.len());
            let n = buf.len().min(self.0.len() - start);
            buf[..n].copy_from_slice(&self.0[start..start + n]);
            Ok(n)
        }
    }

    #[test]
    fn decodes_little_endian_sample_pairs() {
        // Samples 1, -1, 256, -2 as S16LE bytes.
        let source = MemorySource(vec![0x01, 0x00, 0xff, 0xff, 0x00, 0x01, 0xfe, 0xff]);
        let mut loader = ChunkLoader::new(source, 4);
        let mut chunk = [0 as Sample; 4];

        assert!(loader.load(&mut chunk).unwrap());
        assert_eq!(chunk, [1, -1, 256, -2]);
    }

    #[test]
    fn advances_one_chunk_of_bytes_per_load() {
        let source = MemorySource((0u8..16).collect());
        let mut loader = ChunkLoader::new(source, 4);
        let mut chunk = [0 as Sample; 4];

        assert!(loader.load(&mut chunk).unwrap());
        assert_eq!(chunk[0], Sample::from_le_bytes([0, 1]));
        assert!(loader.load(&mut chunk).unwrap());
        assert_eq!(chunk[0], Sample::from_le_bytes([8, 9]));
        assert!(!loader.load(&mut chunk).unwrap());
    }

    #[test]
    fn short_read_zero_fills_the_tail() {
        // 4 bytes of data against a 4-sample (8-byte) chunk.
        let source = MemorySource(vec![0x01, 0x00, 0x02, 0x00]);
        let mut loader = ChunkLoader::new(source, 4);
        let mut chunk = [7 as Sample; 4];

        assert!(loader.load(&mut chunk).unwrap());
        assert_eq!(chunk, [1, 2, 0, 0]);

        // The offset moved a full chunk, so the next load is end-of-stream.
        assert!(!loader.load(&mut chunk).unwrap());
    }

    #[test]
    fn empty_source_signals_end_of_stream_immediately() {
        let mut loader = ChunkLoader::new(MemorySource(Vec::new()), 4);
        let mut chunk = [0 as Sample; 4];
        assert!(!loader.load(&mut chunk).unwrap());
    }
}
