use anyhow::{anyhow, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::FrameSource;
use crate::frame::Frame;

/// Deterministic in-memory frame source for tests and demo runs.
///
/// Pixel content is a pure function of `(seed, frame index)`, so a frame
/// re-read after a seek is byte-identical to its first read. The scene
/// shifts every 50 frames, which gives hash-based stub detection something
/// to trigger on.
pub struct SyntheticSource {
    total_frames: u64,
    fps: f64,
    width: u32,
    height: u32,
    cursor: u64,
    seed: u64,
    frames_read: u64,
}

impl SyntheticSource {
    pub fn new(total_frames: u64, fps: f64, width: u32, height: u32) -> Self {
        Self {
            total_frames,
            fps,
            width,
            height,
            cursor: 0,
            seed: 0x5eed_c11b,
            frames_read: 0,
        }
    }

    /// Use a different noise seed (distinct synthetic "recordings").
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Total frames handed out so far, including re-reads after seeks.
    pub fn frames_read(&self) -> u64 {
        self.frames_read
    }

    fn generate_pixels(&self, index: u64) -> Vec<u8> {
        let pixel_count = (self.width as usize) * (self.height as usize) * 3;
        let scene = index / 50;
        let mut rng = StdRng::seed_from_u64(self.seed ^ scene.wrapping_mul(0x9e37_79b9));
        let base: u8 = rng.gen();
        let mut pixels = vec![0u8; pixel_count];
        for (i, pixel) in pixels.iter_mut().enumerate() {
            *pixel = (i as u64)
                .wrapping_add(index)
                .wrapping_add(base as u64)
                .wrapping_rem(256) as u8;
        }
        pixels
    }
}

impl FrameSource for SyntheticSource {
    fn fps(&self) -> f64 {
        self.fps
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn read_next(&mut self) -> Result<Option<Frame>> {
        if self.cursor >= self.total_frames {
            return Ok(None);
        }
        let index = self.cursor;
        self.cursor += 1;
        self.frames_read += 1;

        let pixels = self.generate_pixels(index);
        Ok(Some(Frame::new(index, self.width, self.height, pixels)))
    }

    fn seek(&mut self, frame_index: u64) -> Result<()> {
        if frame_index > self.total_frames {
            return Err(anyhow!(
                "seek target {} beyond stream end {}",
                frame_index,
                self.total_frames
            ));
        }
        self.cursor = frame_index;
        Ok(())
    }
}
