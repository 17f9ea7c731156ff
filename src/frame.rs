//! Decoded video frames.
//!
//! A `Frame` is one decoded picture from a `FrameSource`: a zero-based index
//! into the stream plus an RGB24 pixel buffer. Ownership moves from the
//! source to the engine while it is processed, then to the sink on write.

/// One decoded frame. Pixels are tightly packed RGB24 (`width * height * 3`).
#[derive(Clone, Debug)]
pub struct Frame {
    /// Zero-based position of this frame in the stream.
    pub index: u64,
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl Frame {
    pub fn new(index: u64, width: u32, height: u32, pixels: Vec<u8>) -> Self {
        debug_assert_eq!(pixels.len(), (width as usize) * (height as usize) * 3);
        Self {
            index,
            width,
            height,
            pixels,
        }
    }

    /// Wall-clock time this frame represents, in seconds from stream start.
    pub fn timestamp_secs(&self, fps: f64) -> f64 {
        if fps <= 0.0 {
            return 0.0;
        }
        self.index as f64 / fps
    }

    /// Byte offset of the pixel at (x, y), if inside the frame.
    pub(crate) fn pixel_offset(&self, x: u32, y: u32) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(((y as usize) * (self.width as usize) + x as usize) * 3)
    }

    /// Set the pixel at (x, y). Out-of-bounds writes are ignored.
    pub(crate) fn put_pixel(&mut self, x: u32, y: u32, rgb: [u8; 3]) {
        if let Some(off) = self.pixel_offset(x, y) {
            self.pixels[off..off + 3].copy_from_slice(&rgb);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_follows_index() {
        let frame = Frame::new(90, 2, 2, vec![0; 12]);
        assert_eq!(frame.timestamp_secs(30.0), 3.0);
        assert_eq!(frame.timestamp_secs(0.0), 0.0);
    }

    #[test]
    fn put_pixel_ignores_out_of_bounds() {
        let mut frame = Frame::new(0, 2, 2, vec![0; 12]);
        frame.put_pixel(1, 1, [9, 8, 7]);
        frame.put_pixel(2, 0, [1, 1, 1]);
        assert_eq!(&frame.pixels[9..12], &[9, 8, 7]);
        assert!(frame.pixels[..9].iter().all(|&p| p == 0));
    }
}
