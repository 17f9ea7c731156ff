//! save_clips - extract padded clips around detected events
//!
//! Scans the input sparsely, and when a qualifying detection appears,
//! rewinds by the pre-roll window and writes a densely reviewed segment
//! (pre-roll + event + post-roll) to the output directory.

use anyhow::{anyhow, Result};
use clap::Parser;

use clipscan::source::{FrameSource, SyntheticSource};
use clipscan::{BackendRegistry, ClipConfig, ClipEngine, ImageDirSink, StubBackend};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Input video. `stub://<frames>` runs against the synthetic source.
    #[arg(long, env = "CLIPSCAN_INPUT")]
    input: String,
    /// Output directory for the extracted clip frames.
    #[arg(long, default_value = "./output/clip")]
    output: String,
    /// Detector backend to use.
    #[arg(long, default_value = "stub")]
    backend: String,
    /// Path to an ONNX model (tract backend).
    #[cfg(feature = "backend-tract")]
    #[arg(long)]
    model: Option<String>,
    /// Submit every Nth frame to the detector while scanning.
    #[arg(long)]
    scan_stride: Option<u32>,
    /// Confidence a detection must exceed to qualify.
    #[arg(long)]
    confidence: Option<f32>,
    /// Seconds of context to keep before an event.
    #[arg(long)]
    pre_roll: Option<f64>,
    /// Seconds of context to keep after an event.
    #[arg(long)]
    post_roll: Option<f64>,
    /// Comma-separated class ids that can trigger a clip.
    #[arg(long)]
    classes: Option<String>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = ClipConfig::load()?;
    apply_cli_overrides(&mut config, &args)?;
    config.validate()?;

    let mut source = build_source(&args.input)?;
    let registry = build_registry(&args)?;
    let backend = registry
        .get(&args.backend)
        .ok_or_else(|| anyhow!("backend '{}' not available", args.backend))?;
    let mut sink = ImageDirSink::open(&args.output)?;

    log::info!(
        "save_clips: input={} output={} backend={} stride={} threshold={}",
        args.input,
        args.output,
        args.backend,
        config.scan_stride,
        config.confidence_threshold,
    );

    let mut engine = ClipEngine::new(config);
    let mut detector = backend
        .lock()
        .map_err(|_| anyhow!("backend lock poisoned"))?;
    let summary = engine.run(source.as_mut(), &mut *detector, &mut sink)?;

    log::info!(
        "{} frames written across {} trigger(s)",
        summary.frames_written,
        summary.triggers
    );
    Ok(())
}

fn apply_cli_overrides(config: &mut ClipConfig, args: &Args) -> Result<()> {
    if let Some(stride) = args.scan_stride {
        config.scan_stride = stride;
    }
    if let Some(threshold) = args.confidence {
        config.confidence_threshold = threshold;
    }
    if let Some(secs) = args.pre_roll {
        config.pre_roll_seconds = secs;
    }
    if let Some(secs) = args.post_roll {
        config.post_roll_seconds = secs;
    }
    if let Some(classes) = &args.classes {
        config.target_classes = parse_classes(classes)?;
    }
    Ok(())
}

fn parse_classes(raw: &str) -> Result<Vec<u32>> {
    raw.split(',')
        .map(|entry| entry.trim())
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            entry
                .parse()
                .map_err(|_| anyhow!("invalid class id '{}'", entry))
        })
        .collect()
}

fn build_source(input: &str) -> Result<Box<dyn FrameSource>> {
    if let Some(spec) = input.strip_prefix("stub://") {
        let frames: u64 = spec
            .parse()
            .map_err(|_| anyhow!("stub:// input expects a frame count, got '{}'", spec))?;
        return Ok(Box::new(SyntheticSource::new(frames, 30.0, 640, 480)));
    }

    #[cfg(feature = "source-ffmpeg")]
    {
        Ok(Box::new(clipscan::FileSource::open(input)?))
    }
    #[cfg(not(feature = "source-ffmpeg"))]
    {
        Err(anyhow!(
            "reading video files requires the source-ffmpeg feature (input: {})",
            input
        ))
    }
}

fn build_registry(args: &Args) -> Result<BackendRegistry> {
    let mut registry = BackendRegistry::new();
    registry.register(StubBackend::new());

    #[cfg(feature = "backend-tract")]
    if let Some(model) = &args.model {
        registry.register(clipscan::TractBackend::new(model, 640, 480)?);
    }
    #[cfg(not(feature = "backend-tract"))]
    let _ = args;

    Ok(registry)
}
