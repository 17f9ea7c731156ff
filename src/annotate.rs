//! Dense annotation pass.
//!
//! The simple variant of the scanner: every frame goes through the detector,
//! qualifying detections are drawn onto it, and every frame is written to
//! the sink whether or not anything was found.

use std::time::Instant;

use anyhow::Result;

use crate::config::ClipConfig;
use crate::detect::DetectorBackend;
use crate::engine::RunSummary;
use crate::overlay;
use crate::sink::FrameSink;
use crate::source::FrameSource;

/// Annotate every frame of `source` into `sink`.
///
/// Terminates on stream exhaustion; the sink is closed on every exit path.
pub fn annotate_video(
    source: &mut dyn FrameSource,
    detector: &mut dyn DetectorBackend,
    sink: &mut dyn FrameSink,
    config: &ClipConfig,
) -> Result<RunSummary> {
    let started = Instant::now();

    let result = annotate_loop(source, detector, sink, config);
    let close_result = sink.close();
    let (frames_read, frames_written) = result?;
    close_result?;

    let summary = RunSummary {
        frames_read,
        frames_inferred: frames_read,
        frames_written,
        triggers: 0,
        elapsed: started.elapsed(),
    };
    log::info!(
        "annotation finished: {} frames in {}m {}s",
        summary.frames_written,
        summary.elapsed.as_secs() / 60,
        summary.elapsed.as_secs() % 60,
    );
    Ok(summary)
}

fn annotate_loop(
    source: &mut dyn FrameSource,
    detector: &mut dyn DetectorBackend,
    sink: &mut dyn FrameSink,
    config: &ClipConfig,
) -> Result<(u64, u64)> {
    let mut frames_read = 0u64;
    let mut frames_written = 0u64;

    loop {
        let mut frame = match source.read_next() {
            Ok(Some(frame)) => frame,
            Ok(None) => break,
            Err(e) => {
                log::warn!("frame read failed: {} (stopping)", e);
                break;
            }
        };
        frames_read += 1;

        let detections = detector.detect(&frame.pixels, frame.width, frame.height)?;
        let qualifying: Vec<_> = detections
            .into_iter()
            .filter(|d| config.is_qualifying(d))
            .collect();
        if !qualifying.is_empty() {
            overlay::draw_detections(&mut frame, &qualifying, detector);
        }

        sink.write(&frame)?;
        frames_written += 1;
    }

    Ok((frames_read, frames_written))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::StubBackend;
    use crate::sink::MemorySink;
    use crate::source::SyntheticSource;

    #[test]
    fn every_frame_is_written() {
        let mut source = SyntheticSource::new(120, 30.0, 16, 16);
        let mut detector = StubBackend::new();
        let mut sink = MemorySink::new();
        let config = ClipConfig::default();

        let summary = annotate_video(&mut source, &mut detector, &mut sink, &config).unwrap();

        assert_eq!(summary.frames_written, 120);
        assert_eq!(sink.written().len(), 120);
        assert_eq!(sink.written()[0], 0);
        assert_eq!(*sink.written().last().unwrap(), 119);
        assert!(sink.is_closed());
    }
}
