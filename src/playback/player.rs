//! Chunk player
//!
//! Writes a fully computed output chunk to the device in period-sized
//! slices. An underrun is recoverable: the device is prepared again and the
//! failed slice is skipped rather than retried, so playback degrades by
//! dropping audio instead of stalling.

use tracing::warn;

use crate::audio::output::{OutputDevice, WriteOutcome};
use crate::audio::types::{Sample, CHANNELS};
use crate::error::Result;

/// Feeds computed chunks to the output device.
pub struct ChunkPlayer<D: OutputDevice> {
    device: D,
    underruns: u64,
}

impl<D: OutputDevice> ChunkPlayer<D> {
    pub fn new(device: D) -> Self {
        Self {
            device,
            underruns: 0,
        }
    }

    /// Play one chunk, split into device-period-sized writes.
    pub fn play(&mut self, chunk: &[Sample]) -> Result<()> {
        let period_samples = self.device.period_frames().max(1) * CHANNELS;
        for slice in chunk.chunks(period_samples) {
            match self.device.write(slice)? {
                WriteOutcome::Written(_) => {}
                WriteOutcome::Underrun => {
                    self.underruns += 1;
                    warn!(
                        "device underrun, skipping {} frames after reset",
                        slice.len() / CHANNELS
                    );
                    self.device.prepare()?;
                }
            }
        }
        Ok(())
    }

    /// Underruns observed so far.
    pub fn underruns(&self) -> u64 {
        self.underruns
    }

    /// Wait for queued audio to reach the device.
    pub fn drain(&mut self) -> Result<()> {
        self.device.drain()
    }
}
