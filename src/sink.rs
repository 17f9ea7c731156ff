//! Frame sinks.
//!
//! A `FrameSink` appends frames to an output stream in call order and
//! finalizes it on `close`. Container/codec output is out of scope, so the
//! concrete sinks are deliberately simple: an in-memory recorder for tests
//! and summaries, and a numbered-JPEG directory writer.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use image::{ImageBuffer, Rgb};

use crate::frame::Frame;

/// Appends frames to an output stream, preserving resolution and frame rate.
pub trait FrameSink {
    /// Append a frame. Frames arrive in the order they should play back.
    fn write(&mut self, frame: &Frame) -> Result<()>;

    /// Flush and finalize the output. Called on every exit path.
    fn close(&mut self) -> Result<()>;
}

/// In-memory sink recording the indices of written frames.
///
/// Used by tests to assert write order and dedup behavior, and by dry runs
/// to report what a real sink would have received.
#[derive(Default)]
pub struct MemorySink {
    written: Vec<u64>,
    closed: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Indices of frames written so far, in write order.
    pub fn written(&self) -> &[u64] {
        &self.written
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl FrameSink for MemorySink {
    fn write(&mut self, frame: &Frame) -> Result<()> {
        self.written.push(frame.index);
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}

/// Sink writing each frame as a numbered JPEG into a directory.
///
/// The directory is created if missing. Files are named by frame index
/// (`frame_0000042.jpg`) so the clip plays back in lexical order.
pub struct ImageDirSink {
    dir: PathBuf,
    frames_written: u64,
}

impl ImageDirSink {
    /// Open (and if needed create) the output directory.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create output directory {}", dir.display()))?;
        Ok(Self {
            dir,
            frames_written: 0,
        })
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }
}

impl FrameSink for ImageDirSink {
    fn write(&mut self, frame: &Frame) -> Result<()> {
        let image: ImageBuffer<Rgb<u8>, _> =
            ImageBuffer::from_raw(frame.width, frame.height, frame.pixels.clone())
                .context("frame pixel buffer does not match its dimensions")?;
        let path = self.dir.join(format!("frame_{:07}.jpg", frame.index));
        image
            .save(&path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        self.frames_written += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        log::info!(
            "ImageDirSink: {} frames written to {}",
            self.frames_written,
            self.dir.display()
        );
        Ok(())
    }
}
