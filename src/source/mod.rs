//! Frame sources.
//!
//! A `FrameSource` is a sequential, seekable provider of decoded frames at a
//! fixed frame rate. Two implementations are provided:
//! - `SyntheticSource`: deterministic in-memory frames (tests, demo runs)
//! - `FileSource` (feature: source-ffmpeg): local video files via FFmpeg
//!
//! The clip engine relies on exact backward seeks: after `seek(n)`, the next
//! `read_next` must return frame `n`. End of stream is `Ok(None)`, not an
//! error; only failure to open a source is fatal.

use anyhow::Result;

use crate::frame::Frame;

#[cfg(feature = "source-ffmpeg")]
mod ffmpeg;
mod synthetic;

#[cfg(feature = "source-ffmpeg")]
pub use ffmpeg::FileSource;
pub use synthetic::SyntheticSource;

/// Sequential, seekable provider of decoded video frames.
pub trait FrameSource {
    /// Frame rate of the stream (frames per second).
    fn fps(&self) -> f64;

    /// Frame width in pixels.
    fn width(&self) -> u32;

    /// Frame height in pixels.
    fn height(&self) -> u32;

    /// Read the next frame, or `Ok(None)` once the stream is exhausted.
    fn read_next(&mut self) -> Result<Option<Frame>>;

    /// Reposition the read cursor so the next read returns `frame_index`.
    ///
    /// Backward seeks must be exact; the engine rewinds by precise frame
    /// counts when it enters dense review.
    fn seek(&mut self, frame_index: u64) -> Result<()>;
}
