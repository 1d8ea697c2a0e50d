//! # echostream
//!
//! Streams a raw PCM audio file to an output device while applying a
//! recursive echo filter in real time.
//!
//! **Architecture:** a four-slot output-buffer rotation lets filter
//! computation for one chunk overlap, without locks, with device playback
//! of an earlier chunk. Each cycle runs a load+filter task and a play task
//! on disjoint chunks, joined before the rotation advances; the recursive
//! filter reads one chunk of input/output history for taps that straddle
//! chunk boundaries.

pub mod audio;
pub mod config;
pub mod error;
pub mod playback;

pub use error::{Error, Result};
