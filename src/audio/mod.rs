//! Audio primitives and external collaborators

pub mod file;
pub mod filter;
pub mod output;
pub mod types;

pub use file::{PcmFile, SampleSource};
pub use filter::EchoFilter;
pub use output::{AudioOutput, CpalSink, OutputDevice, WriteOutcome};
pub use types::{clip, Sample};
