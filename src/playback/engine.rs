//! Playback pipeline engine
//!
//! Orchestrates one load+filter task and one play task per cycle. The two
//! tasks operate on disjoint chunks of the rotation arena, so the scoped
//! join at the end of each cycle is the only synchronization: no chunk is
//! read as play or feedback history until the cycle that wrote it has been
//! joined, and the phase never advances with a task in flight.
//!
//! Lifecycle: two preload cycles fill the first output chunks before any
//! playback, the running loop pairs loading with playing, and once the
//! loader reports end of stream the remaining computed chunks drain out.

use std::thread;

use tracing::{debug, info};

use crate::audio::file::SampleSource;
use crate::audio::filter::EchoFilter;
use crate::audio::output::OutputDevice;
use crate::audio::types::{CHANNELS, CHUNK_SAMPLES};
use crate::error::{Error, Result};
use crate::playback::loader::ChunkLoader;
use crate::playback::player::ChunkPlayer;
use crate::playback::rotation::{ChunkArena, CycleRoles};
use crate::playback::state::PipelineState;

/// Load+filter cycles run before the first play task, so that the play and
/// feedback roles both point at completed chunks once playback starts.
const PRELOAD_CYCLES: usize = 2;

/// The streaming pipeline: arena, filter, and the two per-cycle tasks.
pub struct Pipeline<S: SampleSource, D: OutputDevice> {
    arena: ChunkArena,
    filter: EchoFilter,
    loader: ChunkLoader<S>,
    player: ChunkPlayer<D>,
    state: PipelineState,
    end_of_stream: bool,
    chunks_loaded: u64,
    chunks_played: u64,
}

impl<S: SampleSource, D: OutputDevice> Pipeline<S, D> {
    /// Build a pipeline with the reference filter and chunk geometry.
    pub fn new(source: S, device: D) -> Result<Self> {
        Self::with_parts(source, device, EchoFilter::default(), CHUNK_SAMPLES)
    }

    /// Build a pipeline with an explicit filter and chunk size in samples.
    ///
    /// The chunk must hold the filter's whole tap history, so that one
    /// chunk of input/output history is always enough for wrapped reads.
    pub fn with_parts(
        source: S,
        device: D,
        filter: EchoFilter,
        chunk_samples: usize,
    ) -> Result<Self> {
        if chunk_samples == 0 || chunk_samples % CHANNELS != 0 {
            return Err(Error::Config(format!(
                "chunk size must be a positive multiple of {} samples, got {}",
                CHANNELS, chunk_samples
            )));
        }
        let frames = chunk_samples / CHANNELS;
        if frames < filter.history_frames() {
            return Err(Error::Config(format!(
                "chunk of {} frames cannot hold the filter's {}-frame history",
                frames,
                filter.history_frames()
            )));
        }

        Ok(Self {
            arena: ChunkArena::new(chunk_samples),
            loader: ChunkLoader::new(source, chunk_samples),
            player: ChunkPlayer::new(device),
            filter,
            state: PipelineState::Preloading,
            end_of_stream: false,
            chunks_loaded: 0,
            chunks_played: 0,
        })
    }

    /// Current lifecycle state.
    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Chunks loaded and filtered so far.
    pub fn chunks_loaded(&self) -> u64 {
        self.chunks_loaded
    }

    /// Chunks handed to the device so far.
    pub fn chunks_played(&self) -> u64 {
        self.chunks_played
    }

    /// Device underruns observed so far.
    pub fn underruns(&self) -> u64 {
        self.player.underruns()
    }

    /// Stream the whole source through the filter to the device.
    ///
    /// Returns once every loaded chunk has been played and the device has
    /// been drained.
    pub fn run(&mut self) -> Result<()> {
        info!("preloading {} chunks", PRELOAD_CYCLES);
        self.preload()?;

        if self.end_of_stream {
            self.set_state(PipelineState::Draining);
        } else {
            self.set_state(PipelineState::Running);
        }

        while self.chunks_played < self.chunks_loaded {
            self.cycle()?;
        }

        self.player.drain()?;
        self.set_state(PipelineState::Stopped);
        info!(
            chunks = self.chunks_played,
            underruns = self.player.underruns(),
            "playback finished"
        );
        Ok(())
    }

    /// Run the initial load+filter cycles with no concurrent playback.
    ///
    /// The phase advances on every preload cycle even at end of stream, so
    /// the play role lines up with the first loaded chunk afterwards.
    fn preload(&mut self) -> Result<()> {
        for _ in 0..PRELOAD_CYCLES {
            if !self.end_of_stream {
                let filter = &self.filter;
                let loader = &mut self.loader;
                let CycleRoles {
                    curr_in,
                    prev_in,
                    load_out,
                    feedback_out,
                    ..
                } = self.arena.roles();

                if loader.load(curr_in)? {
                    filter.process_chunk(curr_in, prev_in, load_out, feedback_out);
                    self.chunks_loaded += 1;
                } else {
                    self.end_of_stream = true;
                }
            }
            self.arena.advance();
        }
        Ok(())
    }

    /// One running/draining cycle: play task and load+filter task in
    /// parallel on disjoint chunks, joined before the phase advances.
    fn cycle(&mut self) -> Result<()> {
        let play_ready = self.chunks_played < self.chunks_loaded;
        let run_load = !self.end_of_stream;

        let filter = &self.filter;
        let loader = &mut self.loader;
        let player = &mut self.player;
        let CycleRoles {
            curr_in,
            prev_in,
            load_out,
            play_out,
            feedback_out,
        } = self.arena.roles();

        let (load_res, play_res) = thread::scope(|scope| {
            let play_task = play_ready.then(|| scope.spawn(move || player.play(play_out)));

            let load_res = if run_load {
                match loader.load(curr_in) {
                    Ok(true) => {
                        filter.process_chunk(curr_in, prev_in, load_out, feedback_out);
                        Ok(true)
                    }
                    other => other,
                }
            } else {
                Ok(false)
            };

            let play_res = match play_task {
                Some(handle) => match handle.join() {
                    Ok(result) => result,
                    Err(_) => Err(Error::Playback("play task panicked".to_string())),
                },
                None => Ok(()),
            };

            (load_res, play_res)
        });

        play_res?;
        let loaded_more = load_res?;

        if play_ready {
            self.chunks_played += 1;
        }
        if run_load {
            if loaded_more {
                self.chunks_loaded += 1;
            } else {
                self.end_of_stream = true;
                self.set_state(PipelineState::Draining);
            }
        }

        self.arena.advance();
        Ok(())
    }

    fn set_state(&mut self, next: PipelineState) {
        debug!(from = %self.state, to = %next, "pipeline state change");
        self.state = next;
    }
}
