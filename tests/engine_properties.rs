//! End-to-end properties of the clip engine, exercised with scripted
//! collaborators instead of real video files: a source whose pixels encode
//! the frame index, and a detector that fires at chosen indices.

use anyhow::Result;

use clipscan::{
    BoundingBox, ClipConfig, ClipEngine, Detection, DetectorBackend, Frame, FrameSource,
    MemorySink, ScanState,
};

const W: u32 = 64;
const H: u32 = 64;

struct ScriptedSource {
    total: u64,
    cursor: u64,
    fps: f64,
}

impl ScriptedSource {
    fn new(total: u64) -> Self {
        Self {
            total,
            cursor: 0,
            fps: 30.0,
        }
    }
}

impl FrameSource for ScriptedSource {
    fn fps(&self) -> f64 {
        self.fps
    }
    fn width(&self) -> u32 {
        W
    }
    fn height(&self) -> u32 {
        H
    }
    fn read_next(&mut self) -> Result<Option<Frame>> {
        if self.cursor >= self.total {
            return Ok(None);
        }
        let index = self.cursor;
        self.cursor += 1;
        let mut pixels = vec![0u8; (W * H * 3) as usize];
        pixels[..8].copy_from_slice(&index.to_le_bytes());
        Ok(Some(Frame::new(index, W, H, pixels)))
    }
    fn seek(&mut self, frame_index: u64) -> Result<()> {
        self.cursor = frame_index;
        Ok(())
    }
}

/// Fires a confident class-3 detection at the scripted indices. With
/// `noise`, every other frame also carries a low-confidence detection that
/// must never qualify.
struct ScriptedDetector {
    hits: Vec<u64>,
    noise: bool,
}

impl ScriptedDetector {
    fn at(hits: Vec<u64>) -> Self {
        Self { hits, noise: false }
    }
}

impl DetectorBackend for ScriptedDetector {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn detect(&mut self, pixels: &[u8], _w: u32, _h: u32) -> Result<Vec<Detection>> {
        let mut raw = [0u8; 8];
        raw.copy_from_slice(&pixels[..8]);
        let index = u64::from_le_bytes(raw);

        let bbox = BoundingBox {
            cx: 32.0,
            cy: 32.0,
            w: 10.0,
            h: 10.0,
        };
        if self.hits.contains(&index) {
            Ok(vec![Detection::new(3, 0.95, bbox)])
        } else if self.noise {
            Ok(vec![Detection::new(3, 0.5, bbox)])
        } else {
            Ok(Vec::new())
        }
    }
}

fn config() -> ClipConfig {
    ClipConfig {
        target_classes: vec![3],
        ..ClipConfig::default()
    }
}

fn run(total: u64, detector: &mut ScriptedDetector) -> (clipscan::RunSummary, MemorySink, ClipEngine) {
    let mut source = ScriptedSource::new(total);
    let mut sink = MemorySink::new();
    let mut engine = ClipEngine::new(config());
    let summary = engine.run(&mut source, detector, &mut sink).unwrap();
    (summary, sink, engine)
}

fn assert_strictly_increasing(written: &[u64]) {
    for pair in written.windows(2) {
        assert!(
            pair[0] < pair[1],
            "writes not strictly increasing: {} then {}",
            pair[0],
            pair[1]
        );
    }
}

#[test]
fn no_qualifying_detections_writes_nothing() {
    let mut detector = ScriptedDetector {
        hits: vec![],
        noise: true,
    };
    let (summary, sink, engine) = run(300, &mut detector);

    assert!(sink.written().is_empty());
    assert!(sink.is_closed());
    assert_eq!(summary.triggers, 0);
    assert_eq!(summary.frames_read, 300);
    // Only every 10th frame went through the detector.
    assert_eq!(summary.frames_inferred, 30);
    assert_eq!(engine.state(), ScanState::SparseScan);
}

#[test]
fn single_trigger_writes_padded_segment_once() {
    // fps=30, pre=post=2s: trigger at 100 covers 40..=160.
    let mut detector = ScriptedDetector::at(vec![100]);
    let (summary, sink, _) = run(300, &mut detector);

    let expected: Vec<u64> = (40..=160).collect();
    assert_eq!(sink.written(), expected.as_slice());
    assert_eq!(summary.frames_written, 121);
    assert_eq!(summary.triggers, 1);
}

#[test]
fn writes_never_repeat_and_never_go_backward() {
    let mut detector = ScriptedDetector::at(vec![100, 190]);
    let (_, sink, engine) = run(400, &mut detector);

    assert_strictly_increasing(sink.written());
    assert_eq!(engine.last_written_frame(), sink.written().last().copied());
}

#[test]
fn events_inside_post_roll_merge_into_one_segment() {
    // 150 falls inside the post-roll of the 100 trigger; the refreshed
    // window extends the same segment to 150 + 60.
    let mut detector = ScriptedDetector::at(vec![100, 150]);
    let (summary, sink, _) = run(400, &mut detector);

    let expected: Vec<u64> = (40..=210).collect();
    assert_eq!(sink.written(), expected.as_slice());
    assert_eq!(summary.triggers, 1);
}

#[test]
fn rewind_into_written_territory_does_not_reemit() {
    // Second trigger at 190 rewinds to 130, already covered through 160.
    // The skipped frames still consume the window, and output stays
    // contiguous with no duplicates.
    let mut detector = ScriptedDetector::at(vec![100, 190]);
    let (summary, sink, _) = run(400, &mut detector);

    let expected: Vec<u64> = (40..=250).collect();
    assert_eq!(sink.written(), expected.as_slice());
    assert_eq!(summary.triggers, 2);
    assert_strictly_increasing(sink.written());
}

#[test]
fn detections_through_the_pre_roll_do_not_stretch_it() {
    // Constant detections from 60 through 100: the pre-roll still burns
    // down one frame per iteration, and the segment ends one post-roll
    // after the last detection.
    let mut detector = ScriptedDetector::at((60..=100).collect());
    let (_, sink, _) = run(400, &mut detector);

    let expected: Vec<u64> = (0..=160).collect();
    assert_eq!(sink.written(), expected.as_slice());
}

#[test]
fn stream_exhaustion_during_dense_review_ends_cleanly() {
    let mut detector = ScriptedDetector::at(vec![100]);
    let (summary, sink, _) = run(120, &mut detector);

    let expected: Vec<u64> = (40..=119).collect();
    assert_eq!(sink.written(), expected.as_slice());
    assert!(sink.is_closed());
    assert_eq!(summary.frames_written, 80);
}

#[test]
fn zero_length_windows_do_not_stall_the_scan() {
    // Zero pre- and post-roll leaves nothing to capture around an event.
    // The scan must skip past the trigger frame instead of rewinding to it
    // and re-detecting the same frame forever.
    let mut detector = ScriptedDetector::at(vec![10]);
    let mut source = ScriptedSource::new(100);
    let mut sink = MemorySink::new();
    let mut engine = ClipEngine::new(ClipConfig {
        pre_roll_seconds: 0.0,
        post_roll_seconds: 0.0,
        target_classes: vec![3],
        ..ClipConfig::default()
    });

    let summary = engine.run(&mut source, &mut detector, &mut sink).unwrap();

    assert_eq!(summary.frames_read, 100);
    assert_eq!(summary.frames_written, 0);
    assert!(sink.written().is_empty());
    assert!(sink.is_closed());
    assert_eq!(engine.state(), ScanState::SparseScan);
}
