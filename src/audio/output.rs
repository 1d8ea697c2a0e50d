//! Audio output using cpal
//!
//! The playback device is driven through a callback stream. The pipeline's
//! play task hands sample slices to a `CpalSink`, which feeds a lock-free
//! SPSC ring buffer; the stream callback pops samples on the audio thread.
//! A callback that runs dry after the first write marks an underrun, which
//! the next `write` call reports instead of consuming its slice.
//!
//! `cpal::Stream` is not `Send`, so opening the device yields two halves:
//! `AudioOutput` keeps the stream alive on the opening thread, and the
//! `Send` half (`CpalSink`) travels with the play task.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BufferSize, Device, SampleFormat, SampleRate, Stream, StreamConfig};
use ringbuf::{traits::*, HeapCons, HeapProd, HeapRb};
use tracing::{debug, error, info, warn};

use crate::audio::types::{Sample, CHANNELS};
use crate::error::{Error, Result};

/// Ring capacity in device periods.
const RING_PERIODS: usize = 8;

/// Poll interval while the ring is full (write) or emptying (drain).
const WRITE_POLL: Duration = Duration::from_millis(1);

/// How long a full ring may refuse samples before the device counts as stalled.
const STALL_TIMEOUT: Duration = Duration::from_secs(2);

/// Upper bound on waiting for queued samples to reach the device.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Outcome of one device write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The slice was accepted; count in frames.
    Written(usize),
    /// The device ran dry; the slice was not consumed.
    Underrun,
}

/// Playback device as seen by the pipeline's play task.
pub trait OutputDevice: Send {
    /// Preferred transfer granularity in frames, discovered at startup.
    fn period_frames(&self) -> usize;

    /// Write one slice of interleaved samples, blocking on device backpressure.
    fn write(&mut self, samples: &[Sample]) -> Result<WriteOutcome>;

    /// Recover the device after an underrun.
    fn prepare(&mut self) -> Result<()>;

    /// Block until previously written samples have been consumed.
    fn drain(&mut self) -> Result<()>;
}

/// Open audio device and its playback stream.
///
/// Holds the `cpal::Stream`; dropping this stops playback.
pub struct AudioOutput {
    _stream: Stream,
    device_name: String,
    sample_rate: u32,
}

impl AudioOutput {
    /// Open an output device and start its stream.
    ///
    /// Negotiates stereo S16LE-compatible output at 44100 Hz, falling back
    /// to 48000 Hz. If the requested device is not found, falls back to the
    /// system default device.
    ///
    /// Returns the stream owner and the `Send` sink handle for the play task.
    pub fn open(device_name: Option<String>, period_frames: u32) -> Result<(Self, CpalSink)> {
        if period_frames == 0 {
            return Err(Error::Config("device period must be positive".to_string()));
        }

        let host = cpal::default_host();

        let device = if let Some(name) = device_name.as_ref() {
            let mut devices = host
                .output_devices()
                .map_err(|e| Error::AudioOutput(format!("Failed to enumerate devices: {}", e)))?;

            match devices.find(|d| d.name().ok().as_ref() == Some(name)) {
                Some(dev) => {
                    info!("Found requested audio device: {}", name);
                    dev
                }
                None => {
                    warn!("Requested device '{}' not found, falling back to default device", name);
                    host.default_output_device().ok_or_else(|| {
                        Error::AudioOutput(format!(
                            "Device '{}' not found and no default device available",
                            name
                        ))
                    })?
                }
            }
        } else {
            host.default_output_device()
                .ok_or_else(|| Error::AudioOutput("No default output device found".to_string()))?
        };

        let (mut config, sample_format) = Self::negotiate(&device)?;
        config.buffer_size = BufferSize::Fixed(period_frames);

        debug!(
            "Audio config: sample_rate={}, channels={}, format={:?}, period={} frames",
            config.sample_rate.0, config.channels, sample_format, period_frames
        );

        let ring = HeapRb::<Sample>::new(period_frames as usize * CHANNELS * RING_PERIODS);
        let (prod, cons) = ring.split();
        let underrun = Arc::new(AtomicBool::new(false));
        let primed = Arc::new(AtomicBool::new(false));

        let stream = match sample_format {
            SampleFormat::I16 => {
                Self::build_stream_i16(&device, &config, cons, Arc::clone(&underrun), Arc::clone(&primed))?
            }
            SampleFormat::F32 => {
                Self::build_stream_f32(&device, &config, cons, Arc::clone(&underrun), Arc::clone(&primed))?
            }
            sample_format => {
                return Err(Error::AudioOutput(format!(
                    "Unsupported sample format: {:?}",
                    sample_format
                )));
            }
        };

        stream
            .play()
            .map_err(|e| Error::AudioOutput(format!("Failed to start stream: {}", e)))?;

        let device_name = device.name().unwrap_or_else(|_| "Unknown".to_string());
        let sample_rate = config.sample_rate.0;

        Ok((
            Self {
                _stream: stream,
                device_name,
                sample_rate,
            },
            CpalSink {
                prod,
                underrun,
                primed,
                period_frames: period_frames as usize,
            },
        ))
    }

    /// Pick a stereo configuration at 44100 Hz, retrying at 48000 Hz.
    fn negotiate(device: &Device) -> Result<(StreamConfig, SampleFormat)> {
        for rate in [44100u32, 48000] {
            let mut configs = device
                .supported_output_configs()
                .map_err(|e| Error::AudioOutput(format!("Failed to get device configs: {}", e)))?;

            let found = configs.find(|c| {
                c.channels() == CHANNELS as u16
                    && c.min_sample_rate().0 <= rate
                    && c.max_sample_rate().0 >= rate
                    && matches!(c.sample_format(), SampleFormat::I16 | SampleFormat::F32)
            });

            if let Some(supported) = found {
                let sample_format = supported.sample_format();
                let config = supported.with_sample_rate(SampleRate(rate)).config();
                return Ok((config, sample_format));
            }

            warn!("No stereo output configuration at {} Hz", rate);
        }

        Err(Error::AudioOutput(
            "No supported stereo configuration at 44100 or 48000 Hz".to_string(),
        ))
    }

    fn build_stream_i16(
        device: &Device,
        config: &StreamConfig,
        mut cons: HeapCons<Sample>,
        underrun: Arc<AtomicBool>,
        primed: Arc<AtomicBool>,
    ) -> Result<Stream> {
        let stream = device
            .build_output_stream(
                config,
                move |data: &mut [i16], _: &cpal::OutputCallbackInfo| {
                    let mut starved = false;
                    for slot in data.iter_mut() {
                        *slot = match cons.try_pop() {
                            Some(sample) => sample,
                            None => {
                                starved = true;
                                0
                            }
                        };
                    }
                    if starved && primed.load(Ordering::Acquire) {
                        underrun.store(true, Ordering::Release);
                    }
                },
                move |err| error!("Audio stream error: {}", err),
                None,
            )
            .map_err(|e| Error::AudioOutput(format!("Failed to build stream: {}", e)))?;

        Ok(stream)
    }

    fn build_stream_f32(
        device: &Device,
        config: &StreamConfig,
        mut cons: HeapCons<Sample>,
        underrun: Arc<AtomicBool>,
        primed: Arc<AtomicBool>,
    ) -> Result<Stream> {
        let stream = device
            .build_output_stream(
                config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    let mut starved = false;
                    for slot in data.iter_mut() {
                        *slot = match cons.try_pop() {
                            Some(sample) => sample as f32 / 32768.0,
                            None => {
                                starved = true;
                                0.0
                            }
                        };
                    }
                    if starved && primed.load(Ordering::Acquire) {
                        underrun.store(true, Ordering::Release);
                    }
                },
                move |err| error!("Audio stream error: {}", err),
                None,
            )
            .map_err(|e| Error::AudioOutput(format!("Failed to build stream: {}", e)))?;

        Ok(stream)
    }

    /// Name of the opened device.
    pub fn device_name(&self) -> String {
        self.device_name.clone()
    }

    /// Negotiated sample rate.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

/// `Send` half of the audio output: producer side of the stream's ring buffer.
pub struct CpalSink {
    prod: HeapProd<Sample>,
    underrun: Arc<AtomicBool>,
    primed: Arc<AtomicBool>,
    period_frames: usize,
}

impl OutputDevice for CpalSink {
    fn period_frames(&self) -> usize {
        self.period_frames
    }

    fn write(&mut self, samples: &[Sample]) -> Result<WriteOutcome> {
        if self.underrun.load(Ordering::Acquire) {
            return Ok(WriteOutcome::Underrun);
        }

        let mut written = 0;
        let mut stalled_since: Option<Instant> = None;
        while written < samples.len() {
            if self.prod.try_push(samples[written]).is_ok() {
                written += 1;
                stalled_since = None;
            } else {
                let since = *stalled_since.get_or_insert_with(Instant::now);
                if since.elapsed() >= STALL_TIMEOUT {
                    return Err(Error::AudioOutput(
                        "Device stopped consuming samples".to_string(),
                    ));
                }
                thread::sleep(WRITE_POLL);
            }
        }

        self.primed.store(true, Ordering::Release);
        Ok(WriteOutcome::Written(samples.len() / CHANNELS))
    }

    fn prepare(&mut self) -> Result<()> {
        self.underrun.store(false, Ordering::Release);
        Ok(())
    }

    fn drain(&mut self) -> Result<()> {
        let deadline = Instant::now() + DRAIN_TIMEOUT;
        while self.prod.occupied_len() > 0 {
            if Instant::now() >= deadline {
                warn!("Device drain timed out with samples still queued");
                return Ok(());
            }
            thread::sleep(WRITE_POLL);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_does_not_panic_without_hardware() {
        // Opening may fail on machines with no audio system; either outcome
        // is acceptable, it just must not panic.
        let result = AudioOutput::open(None, 1024);
        assert!(result.is_ok() || result.is_err());
    }
}
