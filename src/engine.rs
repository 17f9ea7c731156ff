//! Segment extraction engine.
//!
//! Two-speed scan over a frame source: `SparseScan` polls every Nth frame
//! through the detector; a qualifying detection rewinds the source by the
//! pre-roll window and switches to `DenseReview`, which writes every frame
//! and keeps the clip open while detections keep arriving. Sparse polling
//! amortizes detector cost over long recordings while the dense pass still
//! captures full context around each event.
//!
//! The whole run is a small state struct transitioned by a single `step`
//! function, so the dedup and merge rules are testable with scripted
//! sources and detectors instead of real video files.

use std::time::{Duration, Instant};

use anyhow::Result;

use crate::config::ClipConfig;
use crate::detect::DetectorBackend;
use crate::frame::Frame;
use crate::overlay;
use crate::sink::FrameSink;
use crate::source::FrameSource;

/// Scanning mode. Exactly one is active at any time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScanState {
    /// Stride-sampled polling for a first qualifying detection.
    SparseScan,
    /// Per-frame review of the rewound pre/post window around an event.
    DenseReview,
}

/// What a single `step` decided.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum StepOutcome {
    Continue,
    Finished,
}

/// Counters reported at the end of a run.
#[derive(Clone, Debug)]
pub struct RunSummary {
    pub frames_read: u64,
    pub frames_inferred: u64,
    pub frames_written: u64,
    /// Sparse-scan detections that opened a dense review window.
    pub triggers: u64,
    pub elapsed: Duration,
}

/// The segment extraction state machine.
pub struct ClipEngine {
    config: ClipConfig,
    state: ScanState,
    /// Index of the next frame expected from the source.
    cursor: u64,
    frames_before_remaining: u64,
    frames_after_remaining: u64,
    /// Highest frame index already emitted to the sink.
    last_written_frame: Option<u64>,

    frames_read: u64,
    frames_inferred: u64,
    frames_written: u64,
    triggers: u64,
}

impl ClipEngine {
    pub fn new(config: ClipConfig) -> Self {
        Self {
            config,
            state: ScanState::SparseScan,
            cursor: 0,
            frames_before_remaining: 0,
            frames_after_remaining: 0,
            last_written_frame: None,
            frames_read: 0,
            frames_inferred: 0,
            frames_written: 0,
            triggers: 0,
        }
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    pub fn last_written_frame(&self) -> Option<u64> {
        self.last_written_frame
    }

    /// `(frames_before_remaining, frames_after_remaining)` of the current
    /// dense window.
    pub fn window_counters(&self) -> (u64, u64) {
        (self.frames_before_remaining, self.frames_after_remaining)
    }

    /// Drive the state machine until the source is exhausted.
    ///
    /// The sink is closed on every exit path, including early termination
    /// from a mid-stream read failure.
    pub fn run(
        &mut self,
        source: &mut dyn FrameSource,
        detector: &mut dyn DetectorBackend,
        sink: &mut dyn FrameSink,
    ) -> Result<RunSummary> {
        let started = Instant::now();

        let result = self.run_loop(source, detector, sink);
        let close_result = sink.close();
        result?;
        close_result?;

        let summary = RunSummary {
            frames_read: self.frames_read,
            frames_inferred: self.frames_inferred,
            frames_written: self.frames_written,
            triggers: self.triggers,
            elapsed: started.elapsed(),
        };
        log::info!(
            "clip run finished: {} read, {} inferred, {} written, {} triggers in {}m {}s",
            summary.frames_read,
            summary.frames_inferred,
            summary.frames_written,
            summary.triggers,
            summary.elapsed.as_secs() / 60,
            summary.elapsed.as_secs() % 60,
        );
        Ok(summary)
    }

    fn run_loop(
        &mut self,
        source: &mut dyn FrameSource,
        detector: &mut dyn DetectorBackend,
        sink: &mut dyn FrameSink,
    ) -> Result<()> {
        while self.step(source, detector, sink)? == StepOutcome::Continue {}
        Ok(())
    }

    /// Single transition of the state machine.
    fn step(
        &mut self,
        source: &mut dyn FrameSource,
        detector: &mut dyn DetectorBackend,
        sink: &mut dyn FrameSink,
    ) -> Result<StepOutcome> {
        match self.state {
            ScanState::SparseScan => self.sparse_step(source, detector),
            ScanState::DenseReview => self.dense_step(source, detector, sink),
        }
    }

    fn sparse_step(
        &mut self,
        source: &mut dyn FrameSource,
        detector: &mut dyn DetectorBackend,
    ) -> Result<StepOutcome> {
        let Some(frame) = self.next_frame(source) else {
            return Ok(StepOutcome::Finished);
        };
        self.cursor = frame.index;

        if self.cursor % u64::from(self.config.scan_stride) == 0 {
            log::debug!("scanning frame {}", self.cursor);
            let detections = detector.detect(&frame.pixels, frame.width, frame.height)?;
            self.frames_inferred += 1;

            if let Some(hit) = detections.iter().find(|d| self.config.is_qualifying(d)) {
                log::info!(
                    "event detected at frame {} (class {}, confidence {:.2})",
                    self.cursor,
                    hit.class_id,
                    hit.confidence
                );
                if self.enter_dense_review(source)? {
                    return Ok(StepOutcome::Continue);
                }
            }
        }

        self.cursor += 1;
        Ok(StepOutcome::Continue)
    }

    /// Rewind by the pre-roll window and open a dense review window.
    ///
    /// Returns `false` when both rolls are zero: rewinding to the trigger
    /// frame with nothing owed would hand the same frame straight back to
    /// the sparse scan, which would re-detect it forever. With no window to
    /// capture, the event is logged and the scan moves on.
    fn enter_dense_review(&mut self, source: &mut dyn FrameSource) -> Result<bool> {
        let pre = self.config.pre_roll_frames(source.fps());
        let post = self.config.post_roll_frames(source.fps());
        if pre == 0 && post == 0 {
            log::warn!(
                "pre and post roll are both zero frames, nothing to capture for the event at frame {}",
                self.cursor
            );
            return Ok(false);
        }
        let target = self.cursor.saturating_sub(pre);

        log::info!(
            "rewinding to frame {} ({}s of pre-roll)",
            target,
            self.config.pre_roll_seconds
        );
        source.seek(target)?;

        self.cursor = target;
        self.frames_before_remaining = pre;
        self.frames_after_remaining = post;
        self.state = ScanState::DenseReview;
        self.triggers += 1;
        Ok(true)
    }

    fn dense_step(
        &mut self,
        source: &mut dyn FrameSource,
        detector: &mut dyn DetectorBackend,
        sink: &mut dyn FrameSink,
    ) -> Result<StepOutcome> {
        // Both counters can reach zero through the dedup skip path when the
        // rewind lands entirely inside already-written territory.
        if self.frames_before_remaining == 0 && self.frames_after_remaining == 0 {
            self.exit_dense_review();
            return Ok(StepOutcome::Continue);
        }

        let Some(mut frame) = self.next_frame(source) else {
            return Ok(StepOutcome::Finished);
        };
        self.cursor = frame.index;

        // Rewind re-entered territory that is already in the output. Skip
        // the write but keep consuming the window.
        if self
            .last_written_frame
            .is_some_and(|last| frame.index <= last)
        {
            log::debug!("frame {} already written, skipping", frame.index);
            self.frames_before_remaining = self.frames_before_remaining.saturating_sub(1);
            self.frames_after_remaining = self.frames_after_remaining.saturating_sub(1);
            self.cursor += 1;
            return Ok(StepOutcome::Continue);
        }

        overlay::caption_frame_index(&mut frame);
        sink.write(&frame)?;
        self.last_written_frame = Some(frame.index);
        self.frames_written += 1;
        self.cursor += 1;

        let detections = detector.detect(&frame.pixels, frame.width, frame.height)?;
        self.frames_inferred += 1;
        let qualifying = self.config.any_qualifying(&detections);

        // The pre-roll budget counts down every dense iteration no matter
        // what the detector said.
        self.frames_before_remaining = self.frames_before_remaining.saturating_sub(1);

        if qualifying {
            // Refresh the post-roll window so back-to-back events merge
            // into one continuous segment. Reset and decrement are mutually
            // exclusive within an iteration.
            self.frames_after_remaining = self.config.post_roll_frames(source.fps());
            log::debug!("post-roll refreshed at frame {}", frame.index);
        } else if self.frames_before_remaining == 0 {
            self.frames_after_remaining = self.frames_after_remaining.saturating_sub(1);
        }

        if self.frames_after_remaining == 0 && !qualifying {
            self.exit_dense_review();
        }
        Ok(StepOutcome::Continue)
    }

    fn exit_dense_review(&mut self) {
        log::info!("segment complete, resuming sparse scan at frame {}", self.cursor);
        self.state = ScanState::SparseScan;
    }

    /// End of stream and mid-stream read failures both end the run; only
    /// the failure gets logged.
    fn next_frame(&mut self, source: &mut dyn FrameSource) -> Option<Frame> {
        match source.read_next() {
            Ok(Some(frame)) => {
                self.frames_read += 1;
                Some(frame)
            }
            Ok(None) => {
                log::info!("end of stream at frame {}", self.cursor);
                None
            }
            Err(e) => {
                log::warn!("frame read failed at {}: {} (stopping)", self.cursor, e);
                None
            }
        }
    }
}
