//! echostream - Main entry point
//!
//! Opens the audio device and the raw PCM input file, then streams the
//! file through the echo filter pipeline until end of stream.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use echostream::audio::file::{PcmFile, SampleSource};
use echostream::audio::output::AudioOutput;
use echostream::config::Config;
use echostream::playback::Pipeline;

/// Command-line arguments for echostream
#[derive(Parser, Debug)]
#[command(name = "echostream")]
#[command(about = "Streams a raw PCM file to the audio output through a real-time echo filter")]
#[command(version)]
struct Args {
    /// Raw PCM input file (interleaved 16-bit signed little-endian stereo)
    #[arg(env = "ECHOSTREAM_FILE")]
    file: PathBuf,

    /// Output device name (system default when omitted)
    #[arg(short, long, env = "ECHOSTREAM_DEVICE")]
    device: Option<String>,

    /// Requested device period in frames
    #[arg(long, default_value = "1024", env = "ECHOSTREAM_PERIOD_FRAMES")]
    period_frames: u32,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "echostream=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config = Config {
        file: args.file,
        device: args.device,
        period_frames: args.period_frames,
    };

    let (output, sink) = AudioOutput::open(config.device.clone(), config.period_frames)
        .context("Failed to initialize audio device")?;
    info!(
        device = %output.device_name(),
        rate = output.sample_rate(),
        "audio device initialized"
    );

    let source = PcmFile::open(&config.file).context("Failed to open audio file")?;
    info!(
        file = %config.file.display(),
        bytes = source.len_bytes(),
        "audio file opened"
    );

    let mut pipeline = Pipeline::new(source, sink).context("Failed to build pipeline")?;

    info!("playback started");
    pipeline.run().context("Playback failed")?;

    drop(output);
    Ok(())
}
