//! label_video - draw detection boxes on every frame
//!
//! Runs the detector on every frame of the input, draws boxes and labels
//! for qualifying detections, and writes every frame to the output
//! directory.

use anyhow::{anyhow, Result};
use clap::Parser;

use clipscan::source::{FrameSource, SyntheticSource};
use clipscan::{annotate_video, BackendRegistry, ClipConfig, ImageDirSink, StubBackend};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Input video. `stub://<frames>` runs against the synthetic source.
    #[arg(long, env = "CLIPSCAN_INPUT")]
    input: String,
    /// Output directory for the annotated frames.
    #[arg(long, default_value = "./output/labeled")]
    output: String,
    /// Detector backend to use.
    #[arg(long, default_value = "stub")]
    backend: String,
    /// Path to an ONNX model (tract backend).
    #[cfg(feature = "backend-tract")]
    #[arg(long)]
    model: Option<String>,
    /// Confidence a detection must exceed to be drawn.
    #[arg(long)]
    confidence: Option<f32>,
    /// Comma-separated class ids to draw.
    #[arg(long)]
    classes: Option<String>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = ClipConfig::load()?;
    if let Some(threshold) = args.confidence {
        config.confidence_threshold = threshold;
    }
    if let Some(classes) = &args.classes {
        config.target_classes = parse_classes(classes)?;
    }
    config.validate()?;

    let mut source = build_source(&args.input)?;
    let registry = build_registry(&args)?;
    let backend = registry
        .get(&args.backend)
        .ok_or_else(|| anyhow!("backend '{}' not available", args.backend))?;
    let mut sink = ImageDirSink::open(&args.output)?;

    log::info!(
        "label_video: input={} output={} backend={} threshold={}",
        args.input,
        args.output,
        args.backend,
        config.confidence_threshold,
    );

    let mut detector = backend
        .lock()
        .map_err(|_| anyhow!("backend lock poisoned"))?;
    let summary = annotate_video(source.as_mut(), &mut *detector, &mut sink, &config)?;

    log::info!("{} frames annotated", summary.frames_written);
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
